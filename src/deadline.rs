//! Statutory deadline computation for legal documents
//!
//! Pure lookups and date arithmetic only. A document whose creation instant
//! or delay is unknown has no computable expiry and stays pending until it
//! is explicitly completed.

use crate::document::{DocumentType, LegalDocument};
use crate::dossier::TimeStamp;
use chrono::{Duration, Utc};

pub const DELAI_MISE_EN_DEMEURE_JOURS: u16 = 10;
pub const DELAI_ORDONNANCE_JOURS: u16 = 20;

/// Statutory delay in days for a document type, fixed at creation.
/// The notification PV carries no deadline of its own.
pub fn statutory_delay_days(document_type: DocumentType) -> Option<u16> {
    match document_type {
        DocumentType::PvMiseEnDemeure => Some(DELAI_MISE_EN_DEMEURE_JOURS),
        DocumentType::OrdonnancePaiement => Some(DELAI_ORDONNANCE_JOURS),
        DocumentType::PvNotificationOrdonnance => None,
    }
}

pub fn expires_at(document: &LegalDocument) -> Option<TimeStamp<Utc>> {
    let created = document.date_creation.as_ref()?;
    let delai = document.delai_jours?;

    Some((created.to_datetime_utc() + Duration::days(delai as i64)).into())
}

pub fn is_expired(document: &LegalDocument, now: &TimeStamp<Utc>) -> bool {
    match expires_at(document) {
        Some(deadline) => now.to_datetime_utc() > deadline.to_datetime_utc(),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_is_a_fixed_lookup() {
        assert_eq!(statutory_delay_days(DocumentType::PvMiseEnDemeure), Some(10));
        assert_eq!(statutory_delay_days(DocumentType::OrdonnancePaiement), Some(20));
        assert_eq!(
            statutory_delay_days(DocumentType::PvNotificationOrdonnance),
            None
        );
    }

    #[test]
    fn notification_pv_never_expires() {
        let document = LegalDocument::new(
            "dossier_test",
            DocumentType::PvNotificationOrdonnance,
            "Me Fontaine",
        )
        .unwrap();

        assert_eq!(expires_at(&document), None);
        let far_future = TimeStamp::new_with(2099, 1, 1, 0, 0, 0);
        assert!(!is_expired(&document, &far_future));
    }

    #[test]
    fn missing_creation_instant_means_no_expiry() {
        let mut document = LegalDocument::new(
            "dossier_test",
            DocumentType::PvMiseEnDemeure,
            "Me Fontaine",
        )
        .unwrap();
        document.date_creation = None;

        assert_eq!(expires_at(&document), None);
        let far_future = TimeStamp::new_with(2099, 1, 1, 0, 0, 0);
        assert!(!is_expired(&document, &far_future));
    }

    #[test]
    fn expiry_lands_exactly_delay_days_after_creation() {
        let mut document = LegalDocument::new(
            "dossier_test",
            DocumentType::PvMiseEnDemeure,
            "Me Fontaine",
        )
        .unwrap();
        document.date_creation = Some(TimeStamp::new_with(2024, 6, 1, 12, 0, 0));

        let deadline = expires_at(&document).unwrap();
        assert_eq!(deadline, TimeStamp::new_with(2024, 6, 11, 12, 0, 0));

        // the deadline instant itself is still pending, only strictly past it expires
        assert!(!is_expired(&document, &deadline));
        let just_past = TimeStamp::new_with(2024, 6, 11, 12, 0, 1);
        assert!(is_expired(&document, &just_past));
    }
}
