use anyhow::Context;
use chrono::{Duration, Utc};
use sled::open;
use std::sync::Arc;
use tempfile::tempdir; // Use for test db cleanup.

use dossier_progression::{
    action::ActionType,
    document::{DocumentStatus, DocumentType, LegalDocument},
    dossier::{Departement, Dossier, DossierStatut, TimeStamp},
    error::WorkflowError,
    service::RecoveryService,
    stage::Stage,
    store::{CaseStore, SledCaseStore},
};

#[test]
fn full_progression_to_finance() -> anyhow::Result<()> {
    // sled locks its path, so every test opens its own db under temp
    let temp_dir = tempdir()?;
    let db = Arc::new(open(temp_dir.path().join("full_progression.db"))?);
    let service = RecoveryService::new(SledCaseStore::new(db));

    let dossier = Dossier::new("REC-2024-0001", 1_000_000)?.set_huissier("Me Fontaine");
    service.register_case(&dossier)?;
    assert_eq!(dossier.stage(), Stage::EnAttenteDocuments);

    let document = service
        .create_document(
            &dossier.id,
            DocumentType::PvMiseEnDemeure,
            "Me Fontaine",
            Some(b"pv scan"),
        )
        .context("Failed to issue mise en demeure: ")?;
    assert_eq!(document.delai_jours, Some(10));
    assert!(document.attachment.is_some());

    let dossier_after = service
        .advance_to_actions(&dossier.id)
        .context("Failed to move to actions: ")?;
    assert_eq!(dossier_after.stage(), Stage::EnActions);

    let action = service
        .create_action(
            &dossier.id,
            ActionType::SaisieAttribution,
            None, // falls back to the assigned huissier
            Some(250_000),
            DossierStatut::EnCours,
            None,
        )
        .context("Failed to record action: ")?;
    assert_eq!(action.huissier_name, "Me Fontaine");
    assert_eq!(action.montant_restant, 750_000);

    let dossier_after = service
        .advance_to_audiences(&dossier.id)
        .context("Failed to move to audiences: ")?;
    assert_eq!(dossier_after.stage(), Stage::EnAudiences);

    service.create_audience(&dossier.id, "TGI Lyon", None, Some("renvoi au 12/09"))?;

    let dossier_after = service
        .hand_to_finance(&dossier.id)
        .context("Failed to hand to finance: ")?;
    assert_eq!(dossier_after.stage(), Stage::HandedToFinance);

    Ok(())
}

#[test]
fn reconciliation_follows_edits() -> anyhow::Result<()> {
    // sled locks its path, so every test opens its own db under temp
    let temp_dir = tempdir()?;
    let db = Arc::new(open(temp_dir.path().join("reconciliation.db"))?);
    let service = RecoveryService::new(SledCaseStore::new(db));

    let dossier = Dossier::new("REC-2024-0002", 10_000)?
        .set_huissier("Me Fontaine")
        .set_etape(Stage::EnActions);
    service.register_case(&dossier)?;

    let action_a = service.create_action(
        &dossier.id,
        ActionType::SaisieVente,
        None,
        Some(3_000),
        DossierStatut::EnCours,
        None,
    )?;
    assert_eq!(action_a.montant_restant, 7_000);

    let action_b = service.create_action(
        &dossier.id,
        ActionType::SaisieRemuneration,
        None,
        Some(4_000),
        DossierStatut::EnCours,
        None,
    )?;
    assert_eq!(action_b.montant_restant, 3_000);
    assert_eq!(service.get_case(&dossier.id)?.montant_recupere, 7_000);

    // editing A excludes its prior 3,000 before re-adding the new amount
    let edited = service.update_action(&action_a.id, None, Some(5_000), None)?;
    assert_eq!(edited.montant_restant, 1_000);
    assert_eq!(service.get_case(&dossier.id)?.montant_recupere, 9_000);

    Ok(())
}

#[test]
fn deleting_an_action_refreshes_the_projection() -> anyhow::Result<()> {
    // sled locks its path, so every test opens its own db under temp
    let temp_dir = tempdir()?;
    let db = Arc::new(open(temp_dir.path().join("delete_action.db"))?);
    let service = RecoveryService::new(SledCaseStore::new(db));

    let dossier = Dossier::new("REC-2024-0003", 10_000)?
        .set_huissier("Me Fontaine")
        .set_etape(Stage::EnActions);
    service.register_case(&dossier)?;

    let action = service.create_action(
        &dossier.id,
        ActionType::SaisieImmobiliere,
        None,
        Some(6_000),
        DossierStatut::EnCours,
        None,
    )?;
    assert_eq!(service.get_case(&dossier.id)?.montant_recupere, 6_000);

    service.delete_action(&action.id)?;
    assert_eq!(service.get_case(&dossier.id)?.montant_recupere, 0);
    assert!(service.list_actions(&dossier.id)?.is_empty());

    Ok(())
}

#[test]
fn advancing_requires_a_document() -> anyhow::Result<()> {
    // sled locks its path, so every test opens its own db under temp
    let temp_dir = tempdir()?;
    let db = Arc::new(open(temp_dir.path().join("advance_gate.db"))?);
    let service = RecoveryService::new(SledCaseStore::new(db));

    let dossier = Dossier::new("REC-2024-0004", 50_000)?.set_huissier("Me Fontaine");
    service.register_case(&dossier)?;

    let err = service.advance_to_actions(&dossier.id).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<WorkflowError>(),
        Some(WorkflowError::PreconditionFailed(_))
    ));

    service.create_document(&dossier.id, DocumentType::PvMiseEnDemeure, "Me Fontaine", None)?;

    let dossier_after = service.advance_to_actions(&dossier.id)?;
    assert_eq!(dossier_after.stage(), Stage::EnActions);

    Ok(())
}

#[test]
fn closed_dossier_is_frozen() -> anyhow::Result<()> {
    // sled locks its path, so every test opens its own db under temp
    let temp_dir = tempdir()?;
    let db = Arc::new(open(temp_dir.path().join("closed_freeze.db"))?);
    let service = RecoveryService::new(SledCaseStore::new(db));

    let dossier = Dossier::new("REC-2024-0005", 50_000)?.set_huissier("Me Fontaine");
    service.register_case(&dossier)?;
    service.close_case(&dossier.id)?;

    // still in EN_ATTENTE_DOCUMENTS, but the closure date freezes everything
    let err = service
        .create_document(&dossier.id, DocumentType::PvMiseEnDemeure, "Me Fontaine", None)
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<WorkflowError>(),
        Some(WorkflowError::CaseClosed(_))
    ));

    service.reactivate_case(&dossier.id)?;
    service.create_document(&dossier.id, DocumentType::PvMiseEnDemeure, "Me Fontaine", None)?;

    Ok(())
}

#[test]
fn expired_document_cannot_be_completed() -> anyhow::Result<()> {
    // sled locks its path, so every test opens its own db under temp
    let temp_dir = tempdir()?;
    let db = Arc::new(open(temp_dir.path().join("expired_document.db"))?);
    let store = SledCaseStore::new(db);
    let service = RecoveryService::new(store.clone());

    let dossier = Dossier::new("REC-2024-0006", 50_000)?.set_huissier("Me Fontaine");
    service.register_case(&dossier)?;

    // a mise en demeure issued nine days ago is still pending
    let mut recent =
        LegalDocument::new(&dossier.id, DocumentType::PvMiseEnDemeure, "Me Fontaine")?;
    recent.date_creation = Some((Utc::now() - Duration::days(9)).into());
    store.put_document(&recent)?;
    assert_eq!(
        recent.derive_status(&TimeStamp::new()),
        DocumentStatus::Pending
    );
    service.complete_document(&recent.id)?;

    // one issued eleven days ago has slipped past its statutory ten days
    let mut stale = LegalDocument::new(&dossier.id, DocumentType::PvMiseEnDemeure, "Me Fontaine")?;
    stale.date_creation = Some((Utc::now() - Duration::days(11)).into());
    store.put_document(&stale)?;
    assert_eq!(
        stale.derive_status(&TimeStamp::new()),
        DocumentStatus::Expired
    );

    let err = service.complete_document(&stale.id).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<WorkflowError>(),
        Some(WorkflowError::AlreadyExpired)
    ));

    Ok(())
}

#[test]
fn completing_twice_conflicts() -> anyhow::Result<()> {
    // sled locks its path, so every test opens its own db under temp
    let temp_dir = tempdir()?;
    let db = Arc::new(open(temp_dir.path().join("complete_twice.db"))?);
    let service = RecoveryService::new(SledCaseStore::new(db));

    let dossier = Dossier::new("REC-2024-0007", 50_000)?.set_huissier("Me Fontaine");
    service.register_case(&dossier)?;

    let document =
        service.create_document(&dossier.id, DocumentType::OrdonnancePaiement, "Me Fontaine", None)?;
    service.complete_document(&document.id)?;

    let err = service.complete_document(&document.id).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<WorkflowError>(),
        Some(WorkflowError::AlreadyCompleted)
    ));

    Ok(())
}

#[test]
fn imported_payloads_tolerate_both_stage_spellings() -> anyhow::Result<()> {
    // sled locks its path, so every test opens its own db under temp
    let temp_dir = tempdir()?;
    let db = Arc::new(open(temp_dir.path().join("import_spellings.db"))?);
    let service = RecoveryService::new(SledCaseStore::new(db));

    let snake = service.import_case(
        br#"{"id": "dossier_legacy_a", "montant_creance": 10000,
             "huissier": "Me Fontaine", "etape_huissier": "EN_ACTIONS"}"#,
    )?;
    assert_eq!(snake.stage(), Stage::EnActions);

    let camel = service.import_case(
        br#"{"id": "dossier_legacy_b", "montantCreance": 10000,
             "huissier": "Me Fontaine", "etapeHuissier": "EN_ACTIONS"}"#,
    )?;
    assert_eq!(camel.stage(), Stage::EnActions);

    // both normalize to the same canonical stage, so both accept actions
    for dossier_id in ["dossier_legacy_a", "dossier_legacy_b"] {
        service.create_action(
            dossier_id,
            ActionType::SaisieAttribution,
            None,
            Some(1_000),
            DossierStatut::EnCours,
            None,
        )?;
    }

    Ok(())
}

#[test]
fn action_requires_an_assigned_huissier() -> anyhow::Result<()> {
    // sled locks its path, so every test opens its own db under temp
    let temp_dir = tempdir()?;
    let db = Arc::new(open(temp_dir.path().join("no_huissier.db"))?);
    let service = RecoveryService::new(SledCaseStore::new(db));

    let dossier = Dossier::new("REC-2024-0008", 50_000)?.set_etape(Stage::EnActions);
    service.register_case(&dossier)?;

    let err = service
        .create_action(
            &dossier.id,
            ActionType::SaisieVente,
            None,
            Some(1_000),
            DossierStatut::EnCours,
            None,
        )
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<WorkflowError>(),
        Some(WorkflowError::NoBailiffAssigned(_))
    ));

    Ok(())
}

#[test]
fn documents_and_audiences_can_be_deleted() -> anyhow::Result<()> {
    // sled locks its path, so every test opens its own db under temp
    let temp_dir = tempdir()?;
    let db = Arc::new(open(temp_dir.path().join("deletions.db"))?);
    let service = RecoveryService::new(SledCaseStore::new(db));

    let dossier = Dossier::new("REC-2024-0010", 50_000)?
        .set_huissier("Me Fontaine")
        .set_departement(Departement::Amiable);
    service.register_case(&dossier)?;

    let document =
        service.create_document(&dossier.id, DocumentType::PvMiseEnDemeure, "Me Fontaine", None)?;
    assert_eq!(service.list_documents(&dossier.id)?.len(), 1);

    service.delete_document(&document.id)?;
    assert!(service.list_documents(&dossier.id)?.is_empty());

    // deleting again is a not-found, not a silent no-op
    let err = service.delete_document(&document.id).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<WorkflowError>(),
        Some(WorkflowError::NotFound(_))
    ));

    // audiences are gated on their stage like the other records
    let err = service
        .create_audience(&dossier.id, "TGI Lyon", None, None)
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<WorkflowError>(),
        Some(WorkflowError::StageViolation(_))
    ));

    let mut staged = service.get_case(&dossier.id)?;
    staged.etape = Some(Stage::EnAudiences);
    service.register_case(&staged)?;

    let audience = service.create_audience(&dossier.id, "TGI Lyon", None, None)?;
    assert_eq!(service.list_audiences(&dossier.id)?.len(), 1);

    service.delete_audience(&audience.id)?;
    assert!(service.list_audiences(&dossier.id)?.is_empty());

    Ok(())
}

#[test]
fn blank_huissier_name_is_rejected() -> anyhow::Result<()> {
    // sled locks its path, so every test opens its own db under temp
    let temp_dir = tempdir()?;
    let db = Arc::new(open(temp_dir.path().join("blank_name.db"))?);
    let service = RecoveryService::new(SledCaseStore::new(db));

    // no assigned huissier to fall back on
    let dossier = Dossier::new("REC-2024-0011", 50_000)?;
    service.register_case(&dossier)?;

    let err = service
        .create_document(&dossier.id, DocumentType::PvMiseEnDemeure, "   ", None)
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<WorkflowError>(),
        Some(WorkflowError::Validation(_))
    ));

    Ok(())
}

#[test]
fn finance_handoff_is_stage_independent() -> anyhow::Result<()> {
    // sled locks its path, so every test opens its own db under temp
    let temp_dir = tempdir()?;
    let db = Arc::new(open(temp_dir.path().join("handoff.db"))?);
    let store = SledCaseStore::new(db);
    let service = RecoveryService::new(store.clone());

    // legacy dossier: still waiting on documents, but an audience is on file
    let dossier = Dossier::new("REC-2024-0009", 50_000)?.set_huissier("Me Fontaine");
    service.register_case(&dossier)?;

    let err = service.hand_to_finance(&dossier.id).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<WorkflowError>(),
        Some(WorkflowError::PreconditionFailed(_))
    ));

    let audience =
        dossier_progression::audience::Audience::new(&dossier.id, "TGI Lyon", "Me Fontaine")?;
    store.put_audience(&audience)?;

    let dossier_after = service.hand_to_finance(&dossier.id)?;
    assert_eq!(dossier_after.stage(), Stage::HandedToFinance);

    Ok(())
}
