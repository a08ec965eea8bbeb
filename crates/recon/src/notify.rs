//! Verification outcomes and the presentation collaborators they feed.

use serde::Serialize;

use crate::config::TimingOptions;
use crate::matcher::MatchKind;
use crate::model::ShipmentRecord;

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// At least one pending record flipped to Done. The input field is
    /// cleared immediately and no auto-clear is scheduled.
    Success {
        /// First record that flipped, with its position in the list.
        position: usize,
        record: ShipmentRecord,
        flipped: usize,
        matched: usize,
        kind: MatchKind,
        emphasized: bool,
    },
    /// Every matching record was already Done.
    Info {
        awbs: Vec<String>,
        matched: usize,
        emphasized: bool,
    },
    /// Nothing matched.
    Error { input: String },
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn emphasized(&self) -> bool {
        match self {
            Self::Success { emphasized, .. } | Self::Info { emphasized, .. } => *emphasized,
            Self::Error { .. } => false,
        }
    }

    pub fn cue(&self) -> Cue {
        match self {
            Self::Success { emphasized: true, .. } => Cue::SuccessEmphasized,
            Self::Success { .. } => Cue::Success,
            Self::Info { .. } | Self::Error { .. } => Cue::ErrorOrInfo,
        }
    }

    pub fn notification(&self, timing: &TimingOptions) -> Notification {
        match self {
            Self::Success { record, flipped, matched, kind, emphasized, .. } => {
                let mut body = format!(
                    "{} | {} | {}\n{}",
                    record.courier_partner,
                    record.return_type,
                    record.return_reason,
                    record.product_details()
                );
                if *matched > 1 {
                    body.push_str(&format!("\n{flipped} of {matched} suborders marked"));
                }
                if *kind == MatchKind::Prefix {
                    body.push_str(&format!("\nmatched AWB {} by prefix", record.awb));
                }
                Notification {
                    title: format!("Received {}", record.awb),
                    body,
                    duration_ms: timing.success_toast_ms,
                    emphasized: *emphasized,
                }
            }
            Self::Info { awbs, matched, .. } => Notification {
                title: "Already received".into(),
                body: format!("{} already marked as received ({matched} record(s))", awbs.join(", ")),
                duration_ms: timing.failure_toast_ms,
                emphasized: false,
            },
            Self::Error { input } => Notification {
                title: "Not found".into(),
                body: format!("No shipment matches '{input}'"),
                duration_ms: timing.failure_toast_ms,
                emphasized: false,
            },
        }
    }
}

/// Quality-related reason keyword or a multi-unit quantity.
pub fn is_emphasized(record: &ShipmentRecord, quality_keywords: &[String]) -> bool {
    let reason = record.return_reason.to_lowercase();
    let quality = quality_keywords
        .iter()
        .any(|k| !k.is_empty() && reason.contains(&k.to_lowercase()));
    quality || record.quantity().is_some_and(|q| q > 1)
}

// ---------------------------------------------------------------------------
// Collaborators
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub duration_ms: u64,
    pub emphasized: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Cue {
    Success,
    SuccessEmphasized,
    ErrorOrInfo,
}

/// Toast sink.
pub trait Notifier {
    fn notify(&mut self, notification: Notification);
}

/// Audio cue trigger.
pub trait CuePlayer {
    fn play(&mut self, cue: Cue);
}

/// Route one outcome to both collaborators.
pub fn dispatch(
    outcome: &Outcome,
    timing: &TimingOptions,
    notifier: &mut dyn Notifier,
    cues: &mut dyn CuePlayer,
) {
    notifier.notify(outcome.notification(timing));
    cues.play(outcome.cue());
}
