//! Service layer API for the bailiff progression workflow
use crate::action::{self, ActionType, RecoveryAction};
use crate::audience::Audience;
use crate::document::{DocumentStatus, DocumentType, LegalDocument};
use crate::dossier::{Departement, Dossier, DossierStatut, TimeStamp};
use crate::error::WorkflowError;
use crate::progression::CaseContext;
use crate::stage::Stage;
use crate::store::CaseStore;
use crate::wire;
use tracing::{debug, warn};

pub struct RecoveryService<S: CaseStore> {
    store: S,
    // in future we could add a config for per-departement constraints
}

// explicit name first, then the dossier's assigned huissier
fn resolve_huissier(explicit: Option<&str>, dossier: &Dossier) -> Option<String> {
    explicit
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .or_else(|| {
            dossier
                .huissier
                .clone()
                .filter(|name| !name.trim().is_empty())
        })
}

impl<S: CaseStore> RecoveryService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn get_case(&self, dossier_id: &str) -> anyhow::Result<Dossier> {
        self.store
            .get_case(dossier_id)
            .map_err(WorkflowError::from)?
            .ok_or_else(|| WorkflowError::NotFound(format!("dossier {dossier_id}")).into())
    }

    /// Load everything a caller needs to decide what can happen next
    pub fn load_case_context(&self, dossier_id: &str) -> anyhow::Result<CaseContext> {
        let dossier = self.get_case(dossier_id)?;
        let documents = self
            .store
            .list_documents(dossier_id)
            .map_err(WorkflowError::from)?;
        let actions = self
            .store
            .list_actions(dossier_id)
            .map_err(WorkflowError::from)?;
        let audiences = self
            .store
            .list_audiences(dossier_id)
            .map_err(WorkflowError::from)?;

        // a second bookkeeping path once wrote the case-level amount directly;
        // surface any leftover divergence instead of folding it in
        let ledger = action::cumulative_recovered(&actions, None);
        if dossier.montant_recupere > ledger {
            warn!(
                dossier_id,
                cached = dossier.montant_recupere,
                ledger,
                "cached recovered amount exceeds the action ledger"
            );
        }

        Ok(CaseContext::new(dossier, documents, actions, audiences))
    }

    /// Register a dossier handed over by the intake flow
    pub fn register_case(&self, dossier: &Dossier) -> anyhow::Result<()> {
        self.store.put_case(dossier).map_err(WorkflowError::from)?;
        debug!(dossier_id = %dossier.id, "registered dossier");
        Ok(())
    }

    /// Ingest a remote JSON case payload, normalizing it at the boundary
    pub fn import_case(&self, payload: &[u8]) -> anyhow::Result<Dossier> {
        let dossier = wire::decode_dossier(payload)?;
        self.store.put_case(&dossier).map_err(WorkflowError::from)?;
        debug!(dossier_id = %dossier.id, "imported dossier from remote payload");
        Ok(dossier)
    }

    /// Issue a legal document against a dossier waiting on documents
    pub fn create_document(
        &self,
        dossier_id: &str,
        document_type: DocumentType,
        huissier_name: &str,
        attachment: Option<&[u8]>,
    ) -> anyhow::Result<LegalDocument> {
        let ctx = self.load_case_context(dossier_id)?;
        if !ctx.can_create_document() {
            if ctx.dossier.is_closed() {
                return Err(WorkflowError::CaseClosed(dossier_id.to_string()).into());
            }
            return Err(WorkflowError::StageViolation(ctx.dossier.stage()).into());
        }
        let Some(huissier) = resolve_huissier(Some(huissier_name), &ctx.dossier) else {
            return Err(WorkflowError::Validation("huissier name".to_string()).into());
        };

        let mut document = LegalDocument::new(dossier_id, document_type, &huissier)?;
        if let Some(bytes) = attachment {
            let reference = self
                .store
                .put_attachment(bytes)
                .map_err(WorkflowError::from)?;
            document = document.set_attachment(reference);
        }
        self.store
            .put_document(&document)
            .map_err(WorkflowError::from)?;
        debug!(dossier_id, document_id = %document.id, "created legal document");

        Ok(document)
    }

    /// Mark a pending document as completed; expiry is a point of no return
    pub fn complete_document(&self, document_id: &str) -> anyhow::Result<LegalDocument> {
        let mut document = self
            .store
            .get_document(document_id)
            .map_err(WorkflowError::from)?
            .ok_or_else(|| WorkflowError::NotFound(format!("document {document_id}")))?;

        match document.derive_status(&TimeStamp::new()) {
            DocumentStatus::Completed => Err(WorkflowError::AlreadyCompleted.into()),
            DocumentStatus::Expired => Err(WorkflowError::AlreadyExpired.into()),
            DocumentStatus::Pending => {
                document.completed = true;
                self.store
                    .put_document(&document)
                    .map_err(WorkflowError::from)?;
                debug!(document_id, "document completed");
                Ok(document)
            }
        }
    }

    pub fn delete_document(&self, document_id: &str) -> anyhow::Result<()> {
        let deleted = self
            .store
            .delete_document(document_id)
            .map_err(WorkflowError::from)?;
        if !deleted {
            return Err(WorkflowError::NotFound(format!("document {document_id}")).into());
        }
        Ok(())
    }

    pub fn list_documents(&self, dossier_id: &str) -> anyhow::Result<Vec<LegalDocument>> {
        Ok(self
            .store
            .list_documents(dossier_id)
            .map_err(WorkflowError::from)?)
    }

    /// Record a recovery action; the huissier name falls back to the
    /// dossier's assigned huissier when none is given
    pub fn create_action(
        &self,
        dossier_id: &str,
        action_type: ActionType,
        huissier_name: Option<&str>,
        montant_recupere: Option<u64>,
        etat_resultant: DossierStatut,
        attachment: Option<&[u8]>,
    ) -> anyhow::Result<RecoveryAction> {
        let ctx = self.load_case_context(dossier_id)?;
        if !ctx.can_create_action() {
            if ctx.dossier.is_closed() {
                return Err(WorkflowError::CaseClosed(dossier_id.to_string()).into());
            }
            return Err(WorkflowError::StageViolation(ctx.dossier.stage()).into());
        }
        let Some(huissier) = resolve_huissier(huissier_name, &ctx.dossier) else {
            return Err(WorkflowError::NoBailiffAssigned(dossier_id.to_string()).into());
        };

        let montant = montant_recupere.unwrap_or(0);
        let cumulative = action::cumulative_recovered(&ctx.actions, None) + montant;
        let restant = action::remaining_after(ctx.dossier.montant_creance, cumulative);

        let mut recovery_action = RecoveryAction::new(
            dossier_id,
            action_type,
            &huissier,
            montant,
            restant,
            etat_resultant,
        )?;
        if let Some(bytes) = attachment {
            let reference = self
                .store
                .put_attachment(bytes)
                .map_err(WorkflowError::from)?;
            recovery_action = recovery_action.set_attachment(reference);
        }
        self.store
            .put_action(&recovery_action)
            .map_err(WorkflowError::from)?;
        self.refresh_recovered_projection(dossier_id)?;
        debug!(dossier_id, action_id = %recovery_action.id, montant, "recorded recovery action");

        Ok(recovery_action)
    }

    /// Edit a recovery action and recompute the running balance
    pub fn update_action(
        &self,
        action_id: &str,
        action_type: Option<ActionType>,
        montant_recupere: Option<u64>,
        etat_resultant: Option<DossierStatut>,
    ) -> anyhow::Result<RecoveryAction> {
        let mut recovery_action = self
            .store
            .get_action(action_id)
            .map_err(WorkflowError::from)?
            .ok_or_else(|| WorkflowError::NotFound(format!("action {action_id}")))?;

        let ctx = self.load_case_context(&recovery_action.dossier_id)?;
        if !ctx.can_create_action() {
            if ctx.dossier.is_closed() {
                return Err(WorkflowError::CaseClosed(ctx.dossier.id.clone()).into());
            }
            return Err(WorkflowError::StageViolation(ctx.dossier.stage()).into());
        }

        if let Some(new_type) = action_type {
            recovery_action.action_type = new_type;
        }
        if let Some(montant) = montant_recupere {
            recovery_action.montant_recupere = montant;
        }
        if let Some(etat) = etat_resultant {
            recovery_action.etat_resultant = etat;
        }

        // the action's own prior contribution drops out before the new amount is re-added
        let cumulative = action::cumulative_recovered(&ctx.actions, Some(action_id))
            + recovery_action.montant_recupere;
        recovery_action.montant_restant =
            action::remaining_after(ctx.dossier.montant_creance, cumulative);

        self.store
            .put_action(&recovery_action)
            .map_err(WorkflowError::from)?;
        self.refresh_recovered_projection(&recovery_action.dossier_id)?;
        debug!(action_id, "updated recovery action");

        Ok(recovery_action)
    }

    pub fn delete_action(&self, action_id: &str) -> anyhow::Result<()> {
        let recovery_action = self
            .store
            .get_action(action_id)
            .map_err(WorkflowError::from)?
            .ok_or_else(|| WorkflowError::NotFound(format!("action {action_id}")))?;

        self.store
            .delete_action(action_id)
            .map_err(WorkflowError::from)?;
        self.refresh_recovered_projection(&recovery_action.dossier_id)?;
        Ok(())
    }

    pub fn list_actions(&self, dossier_id: &str) -> anyhow::Result<Vec<RecoveryAction>> {
        Ok(self
            .store
            .list_actions(dossier_id)
            .map_err(WorkflowError::from)?)
    }

    /// Record a court hearing against a dossier in the audiences stage
    pub fn create_audience(
        &self,
        dossier_id: &str,
        tribunal: &str,
        huissier_name: Option<&str>,
        resultat: Option<&str>,
    ) -> anyhow::Result<Audience> {
        let ctx = self.load_case_context(dossier_id)?;
        if !ctx.can_create_audience() {
            if ctx.dossier.is_closed() {
                return Err(WorkflowError::CaseClosed(dossier_id.to_string()).into());
            }
            return Err(WorkflowError::StageViolation(ctx.dossier.stage()).into());
        }
        if tribunal.trim().is_empty() {
            return Err(WorkflowError::Validation("tribunal".to_string()).into());
        }
        let Some(huissier) = resolve_huissier(huissier_name, &ctx.dossier) else {
            return Err(WorkflowError::Validation("huissier name".to_string()).into());
        };

        let mut audience = Audience::new(dossier_id, tribunal, &huissier)?;
        if let Some(note) = resultat {
            audience = audience.set_resultat(note);
        }
        self.store
            .put_audience(&audience)
            .map_err(WorkflowError::from)?;
        debug!(dossier_id, audience_id = %audience.id, "recorded audience");

        Ok(audience)
    }

    pub fn delete_audience(&self, audience_id: &str) -> anyhow::Result<()> {
        let deleted = self
            .store
            .delete_audience(audience_id)
            .map_err(WorkflowError::from)?;
        if !deleted {
            return Err(WorkflowError::NotFound(format!("audience {audience_id}")).into());
        }
        Ok(())
    }

    pub fn list_audiences(&self, dossier_id: &str) -> anyhow::Result<Vec<Audience>> {
        Ok(self
            .store
            .list_audiences(dossier_id)
            .map_err(WorkflowError::from)?)
    }

    /// "Passer aux actions": requires at least one document on file
    pub fn advance_to_actions(&self, dossier_id: &str) -> anyhow::Result<Dossier> {
        let ctx = self.load_case_context(dossier_id)?;
        if ctx.dossier.stage() != Stage::EnAttenteDocuments {
            return Err(WorkflowError::StageViolation(ctx.dossier.stage()).into());
        }
        if !ctx.can_advance_to_actions() {
            return Err(WorkflowError::PreconditionFailed(
                "at least one document must be on file before moving to actions".to_string(),
            )
            .into());
        }

        let mut dossier = ctx.dossier;
        dossier.etape = Some(Stage::EnActions);
        self.store.put_case(&dossier).map_err(WorkflowError::from)?;
        debug!(dossier_id, "dossier advanced to actions");
        Ok(dossier)
    }

    /// "Passer aux audiences": requires at least one recorded action
    pub fn advance_to_audiences(&self, dossier_id: &str) -> anyhow::Result<Dossier> {
        let ctx = self.load_case_context(dossier_id)?;
        if ctx.dossier.stage() != Stage::EnActions {
            return Err(WorkflowError::StageViolation(ctx.dossier.stage()).into());
        }
        if !ctx.can_advance_to_audiences() {
            return Err(WorkflowError::PreconditionFailed(
                "at least one recovery action must be recorded before moving to audiences"
                    .to_string(),
            )
            .into());
        }

        let mut dossier = ctx.dossier;
        dossier.etape = Some(Stage::EnAudiences);
        self.store.put_case(&dossier).map_err(WorkflowError::from)?;
        debug!(dossier_id, "dossier advanced to audiences");
        Ok(dossier)
    }

    /// Finance handoff: reachable from any stage once an action or an
    /// audience is on file
    pub fn hand_to_finance(&self, dossier_id: &str) -> anyhow::Result<Dossier> {
        let ctx = self.load_case_context(dossier_id)?;
        if !ctx.can_hand_to_finance() {
            return Err(WorkflowError::PreconditionFailed(
                "an action or an audience must be on file before the finance handoff".to_string(),
            )
            .into());
        }

        let mut dossier = ctx.dossier;
        dossier.etape = Some(Stage::HandedToFinance);
        dossier.departement = Departement::Finance;
        self.store.put_case(&dossier).map_err(WorkflowError::from)?;
        debug!(dossier_id, "dossier handed to finance");
        Ok(dossier)
    }

    /// Freeze the dossier; no further documents, actions or audiences
    pub fn close_case(&self, dossier_id: &str) -> anyhow::Result<Dossier> {
        let mut dossier = self.get_case(dossier_id)?;
        dossier.date_cloture = Some(TimeStamp::new());
        dossier.statut = DossierStatut::Cloture;
        self.store.put_case(&dossier).map_err(WorkflowError::from)?;
        debug!(dossier_id, "dossier closed");
        Ok(dossier)
    }

    pub fn reactivate_case(&self, dossier_id: &str) -> anyhow::Result<Dossier> {
        let mut dossier = self.get_case(dossier_id)?;
        dossier.date_cloture = None;
        dossier.statut = DossierStatut::EnCours;
        self.store.put_case(&dossier).map_err(WorkflowError::from)?;
        debug!(dossier_id, "dossier reactivated");
        Ok(dossier)
    }

    // the action ledger is authoritative; the dossier only carries a cached copy
    fn refresh_recovered_projection(&self, dossier_id: &str) -> anyhow::Result<()> {
        let mut dossier = self.get_case(dossier_id)?;
        let actions = self
            .store
            .list_actions(dossier_id)
            .map_err(WorkflowError::from)?;

        dossier.montant_recupere = action::cumulative_recovered(&actions, None);
        self.store.put_case(&dossier).map_err(WorkflowError::from)?;
        Ok(())
    }
}
