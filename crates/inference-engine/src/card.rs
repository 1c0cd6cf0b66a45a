//! Static model performance metadata shown alongside estimates

use serde::{Deserialize, Serialize};

/// Offline evaluation results for the deployed model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelCard {
    /// Model family
    pub model: String,
    /// R² on the held-out set
    pub r_squared: f64,
    /// Mean absolute error in dollars
    pub mae: f64,
    pub key_predictors: Vec<String>,
    pub limitations: String,
}

impl Default for ModelCard {
    fn default() -> Self {
        Self {
            model: "XGBoost Regressor".to_string(),
            r_squared: 0.5726,
            mae: 226_510.18,
            key_predictors: vec![
                "Distance from CBD".to_string(),
                "Number of Rooms".to_string(),
            ],
            limitations: "Accuracy may improve with additional features (e.g., land size, suburb)."
                .to_string(),
        }
    }
}

impl ModelCard {
    /// Share of price variance explained, as a percentage
    pub fn explained_variance_pct(&self) -> f64 {
        self.r_squared * 100.0
    }

    /// Accuracy note displayed under a successful estimate
    pub fn disclaimer(&self) -> String {
        format!(
            "Prediction has an average error of ~${} based on model performance (MAE).",
            group_thousands(self.mae.round() as u64)
        )
    }
}

/// Format a dollar amount as `$1,234,567.89`
pub fn format_currency(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("{}${}.{:02}", sign, group_thousands(cents / 100), cents % 100)
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}
