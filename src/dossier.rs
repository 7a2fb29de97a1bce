//! Core dossier types for the recovery pipeline
use crate::stage::Stage;
use crate::utils;
use chrono::{DateTime, TimeZone, Utc};

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DossierStatut {
    #[n(0)]
    EnCours,
    #[n(1)]
    Cloture,
    #[n(2)]
    Suspendu,
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Departement {
    #[n(0)]
    Amiable,
    #[n(1)]
    Juridique,
    #[n(2)]
    Finance,
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq)]
pub struct Dossier {
    #[n(0)]
    pub id: String,
    #[n(1)]
    pub reference: String,
    // amounts are integral centimes
    #[n(2)]
    pub montant_creance: u64,
    // projection of the action ledger, recomputed after every mutation
    #[n(3)]
    pub montant_recupere: u64,
    #[n(4)]
    pub date_cloture: Option<TimeStamp<Utc>>,
    #[n(5)]
    pub statut: DossierStatut,
    #[n(6)]
    pub huissier: Option<String>,
    // absent until a huissier first touches the dossier
    #[n(7)]
    pub etape: Option<Stage>,
    #[n(8)]
    pub departement: Departement,
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone)]
pub struct TimeStamp<T: TimeZone>(DateTime<T>);

impl TimeStamp<Utc> {
    pub fn new() -> Self {
        Self(Utc::now())
    }
    pub fn new_with(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> Self {
        Utc.with_ymd_and_hms(year, month, day, hour, min, sec)
            .unwrap()
            .into()
    }
    pub fn to_datetime_utc(&self) -> DateTime<Utc> {
        self.0
    }
}

impl Dossier {
    pub fn new(reference: &str, montant_creance: u64) -> anyhow::Result<Self> {
        Ok(Self {
            id: utils::new_dossier_id()?,
            reference: reference.to_string(),
            montant_creance,
            montant_recupere: 0,
            date_cloture: None,
            statut: DossierStatut::EnCours,
            huissier: None,
            etape: None,
            departement: Departement::Juridique,
        })
    }
    pub fn set_huissier(mut self, name: &str) -> Self {
        self.huissier = Some(name.to_string());
        self
    }
    pub fn set_etape(mut self, etape: Stage) -> Self {
        self.etape = Some(etape);
        self
    }
    pub fn set_departement(mut self, departement: Departement) -> Self {
        self.departement = departement;
        self
    }
    /// Current bailiff stage; a dossier with none recorded is still waiting on documents
    pub fn stage(&self) -> Stage {
        self.etape.unwrap_or(Stage::EnAttenteDocuments)
    }
    /// Frozen dossiers accept no new documents, actions or audiences
    pub fn is_closed(&self) -> bool {
        self.date_cloture.is_some() || self.statut == DossierStatut::Cloture
    }
    pub fn restant(&self) -> u64 {
        self.montant_creance.saturating_sub(self.montant_recupere)
    }
}

impl DossierStatut {
    pub fn wire_name(&self) -> &'static str {
        match self {
            DossierStatut::EnCours => "EN_COURS",
            DossierStatut::Cloture => "CLOTURE",
            DossierStatut::Suspendu => "SUSPENDU",
        }
    }
    pub fn from_wire(raw: &str) -> Option<Self> {
        match raw {
            "EN_COURS" => Some(DossierStatut::EnCours),
            "CLOTURE" => Some(DossierStatut::Cloture),
            "SUSPENDU" => Some(DossierStatut::Suspendu),
            _ => None,
        }
    }
}

impl Departement {
    pub fn wire_name(&self) -> &'static str {
        match self {
            Departement::Amiable => "AMIABLE",
            Departement::Juridique => "JURIDIQUE",
            Departement::Finance => "FINANCE",
        }
    }
    pub fn from_wire(raw: &str) -> Option<Self> {
        match raw {
            "AMIABLE" => Some(Departement::Amiable),
            "JURIDIQUE" => Some(Departement::Juridique),
            "FINANCE" => Some(Departement::Finance),
            _ => None,
        }
    }
}

impl<T: TimeZone> From<DateTime<T>> for TimeStamp<T> {
    fn from(value: DateTime<T>) -> Self {
        TimeStamp(value)
    }
}

impl<C> minicbor::Encode<C> for TimeStamp<Utc> {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        if let Some(nsec) = self.0.timestamp_nanos_opt() {
            return e.i64(nsec)?.ok();
        }

        Err(minicbor::encode::Error::message(
            "failed to encode timestamp. timestamp_nanos_opt returned None",
        ))
    }
}

impl<'b, C> minicbor::Decode<'b, C> for TimeStamp<Utc> {
    fn decode(d: &mut minicbor::Decoder<'b>, _: &mut C) -> Result<Self, minicbor::decode::Error> {
        let nsecs = d.i64()?;

        Ok(TimeStamp(DateTime::from_timestamp_nanos(nsecs)))
    }
}
