use foundation::FieldId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Share of the field (percent) in each productivity class, 1 = lowest.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub class_1: f64,
    pub class_2: f64,
    pub class_3: f64,
    pub class_4: f64,
    pub class_5: f64,
    pub class_6: f64,
}

impl Classification {
    pub fn shares(&self) -> [f64; 6] {
        [
            self.class_1,
            self.class_2,
            self.class_3,
            self.class_4,
            self.class_5,
            self.class_6,
        ]
    }

    pub fn total(&self) -> f64 {
        self.shares().iter().sum()
    }

    /// Classes 5 and 6.
    pub fn high_productivity(&self) -> f64 {
        self.class_5 + self.class_6
    }

    /// Classes 1 and 2.
    pub fn low_productivity(&self) -> f64 {
        self.class_1 + self.class_2
    }

    /// Shares cover the whole field, allowing for rounding.
    pub fn is_complete(&self) -> bool {
        (self.total() - 100.0).abs() <= 1.0
    }

    /// Class number (1..=6) with the largest share; ties go to the lower class.
    pub fn dominant_class(&self) -> u8 {
        let shares = self.shares();
        let mut best = 0;
        for (i, share) in shares.iter().enumerate() {
            if *share > shares[best] {
                best = i;
            }
        }
        best as u8 + 1
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropRecommendation {
    pub crop: String,
    pub confidence: u32,
    #[serde(rename = "expectedYield")]
    pub expected_yield: String,
    #[serde(rename = "expectedRevenue")]
    pub expected_revenue: String,
    pub season: String,
    pub reasoning: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub field_id: FieldId,
    pub classification: Classification,
    /// URL or base64 data for the rendered classification map.
    pub classification_map_url: String,
    #[serde(default)]
    pub ndvi_stats: Map<String, Value>,
    #[serde(default)]
    pub crop_recommendations: Vec<CropRecommendation>,
    pub profitability_score: i64,
    pub analysis_date: String,
}

impl AnalysisResponse {
    pub fn mean_ndvi(&self) -> Option<f64> {
        self.ndvi_stats
            .get("mean_ndvi_across_years")
            .and_then(Value::as_f64)
    }

    /// `"improving"` or `"declining"` across the analysed years.
    pub fn ndvi_trend(&self) -> Option<&str> {
        self.ndvi_stats.get("trend").and_then(Value::as_str)
    }
}
