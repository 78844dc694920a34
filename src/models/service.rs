use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Service {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub duration_minutes: i32,
    pub category: ServiceCategory,
    pub active: bool,
    pub barbershop_id: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ServiceCategory {
    Hair,
    Beard,
    Combo,
    Other,
}

impl ServiceCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceCategory::Hair => "hair",
            ServiceCategory::Beard => "beard",
            ServiceCategory::Combo => "combo",
            ServiceCategory::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hair" => Some(ServiceCategory::Hair),
            "beard" => Some(ServiceCategory::Beard),
            "combo" => Some(ServiceCategory::Combo),
            "other" => Some(ServiceCategory::Other),
            _ => None,
        }
    }
}
