//! Identifier generation for dossiers and their records

use bech32::Bech32m;
use uuid7::uuid7;

// construct a unique record id then encode using bech32
pub fn new_uuid_to_bech32(hrp: &str) -> anyhow::Result<String> {
    let hrp = bech32::Hrp::parse(hrp)?;
    let encode = bech32::encode::<Bech32m>(hrp, uuid7().as_bytes())?;
    Ok(encode)
}

pub fn new_dossier_id() -> anyhow::Result<String> {
    new_uuid_to_bech32("dossier_")
}

pub fn new_document_id() -> anyhow::Result<String> {
    new_uuid_to_bech32("doc_")
}

pub fn new_action_id() -> anyhow::Result<String> {
    new_uuid_to_bech32("act_")
}

pub fn new_audience_id() -> anyhow::Result<String> {
    new_uuid_to_bech32("aud_")
}
