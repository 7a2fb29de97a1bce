//! Legal documents issued against a dossier
use crate::deadline;
use crate::dossier::TimeStamp;
use crate::utils;
use chrono::Utc;

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentType {
    #[n(0)]
    PvMiseEnDemeure,
    #[n(1)]
    OrdonnancePaiement,
    #[n(2)]
    PvNotificationOrdonnance,
}

/// Derived on read from the completed flag and the statutory deadline,
/// never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentStatus {
    Pending,
    Expired,
    Completed,
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq)]
pub struct LegalDocument {
    #[n(0)]
    pub id: String,
    #[n(1)]
    pub dossier_id: String,
    #[n(2)]
    pub document_type: DocumentType,
    // legacy rows can miss their creation instant; such documents never expire
    #[n(3)]
    pub date_creation: Option<TimeStamp<Utc>>,
    // fixed from the type at creation, immutable afterwards
    #[n(4)]
    pub delai_jours: Option<u16>,
    // content hash of the stored binary part
    #[n(5)]
    pub attachment: Option<String>,
    #[n(6)]
    pub huissier_name: String,
    #[n(7)]
    pub completed: bool,
}

impl DocumentType {
    pub fn wire_name(&self) -> &'static str {
        match self {
            DocumentType::PvMiseEnDemeure => "PV_MISE_EN_DEMEURE",
            DocumentType::OrdonnancePaiement => "ORDONNANCE_PAIEMENT",
            DocumentType::PvNotificationOrdonnance => "PV_NOTIFICATION_ORDONNANCE",
        }
    }
    pub fn from_wire(raw: &str) -> Option<Self> {
        match raw {
            "PV_MISE_EN_DEMEURE" => Some(DocumentType::PvMiseEnDemeure),
            "ORDONNANCE_PAIEMENT" => Some(DocumentType::OrdonnancePaiement),
            "PV_NOTIFICATION_ORDONNANCE" => Some(DocumentType::PvNotificationOrdonnance),
            _ => None,
        }
    }
}

impl LegalDocument {
    pub fn new(
        dossier_id: &str,
        document_type: DocumentType,
        huissier_name: &str,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            id: utils::new_document_id()?,
            dossier_id: dossier_id.to_string(),
            document_type,
            date_creation: Some(TimeStamp::new()),
            delai_jours: deadline::statutory_delay_days(document_type),
            attachment: None,
            huissier_name: huissier_name.to_string(),
            completed: false,
        })
    }
    pub fn set_attachment(mut self, reference: String) -> Self {
        self.attachment = Some(reference);
        self
    }
    /// Completion wins over expiry; a document only expires out of pending.
    pub fn derive_status(&self, now: &TimeStamp<Utc>) -> DocumentStatus {
        if self.completed {
            return DocumentStatus::Completed;
        }
        if deadline::is_expired(self, now) {
            return DocumentStatus::Expired;
        }
        DocumentStatus::Pending
    }
}
