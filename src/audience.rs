//! Court hearings recorded against a dossier
//!
//! An audience on file makes the dossier eligible for the finance handoff
//! even when no action was ever recorded.

use crate::dossier::TimeStamp;
use crate::utils;
use chrono::Utc;

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq)]
pub struct Audience {
    #[n(0)]
    pub id: String,
    #[n(1)]
    pub dossier_id: String,
    #[n(2)]
    pub date_audience: TimeStamp<Utc>,
    #[n(3)]
    pub tribunal: String,
    #[n(4)]
    pub resultat: Option<String>,
    #[n(5)]
    pub huissier_name: String,
}

impl Audience {
    pub fn new(dossier_id: &str, tribunal: &str, huissier_name: &str) -> anyhow::Result<Self> {
        Ok(Self {
            id: utils::new_audience_id()?,
            dossier_id: dossier_id.to_string(),
            date_audience: TimeStamp::new(),
            tribunal: tribunal.to_string(),
            resultat: None,
            huissier_name: huissier_name.to_string(),
        })
    }
    pub fn set_resultat(mut self, resultat: &str) -> Self {
        self.resultat = Some(resultat.to_string());
        self
    }
}
