//! Result Fuser
//!
//! Renders record sets and passages into one grounding document:
//!
//! ```text
//! WALLET: userId: U1, name: Ann, walletBal: 100
//!
//! KYC: userId: U1, kyc_vfy: true
//!
//! <passage text>
//! <passage text>
//! ```
//!
//! Structured blocks come first, in fetch order, then passages in rank order.
//! Output depends only on the inputs.

use crate::models::{GroundingContext, Passage, Record, RecordSet};

/// Context emitted when neither source contributed anything.
pub const NO_DATA_FOUND: &str = "No data found";

pub struct ResultFuser;

impl ResultFuser {
    pub fn fuse(record_sets: &[RecordSet], passages: &[Passage]) -> GroundingContext {
        let mut blocks: Vec<String> = record_sets
            .iter()
            .filter(|set| !set.is_empty())
            .map(render_record_set)
            .collect();

        let passage_block = passages
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        if !passage_block.is_empty() {
            blocks.push(passage_block);
        }

        if blocks.is_empty() {
            return GroundingContext::new(NO_DATA_FOUND.to_string());
        }

        GroundingContext::new(blocks.join("\n\n"))
    }
}

fn render_record_set(set: &RecordSet) -> String {
    let label = set.domain.label();
    set.records
        .iter()
        .map(|record| format!("{}: {}", label, render_record(record)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// `field: value` pairs in column order, null fields omitted.
fn render_record(record: &Record) -> String {
    record
        .fields()
        .filter(|(_, value)| !value.is_null())
        .map(|(name, value)| format!("{}: {}", name, value))
        .collect::<Vec<_>>()
        .join(", ")
}
