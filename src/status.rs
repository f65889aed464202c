//! Proposal lifecycle statuses and their descriptions.

/// Fallback for statuses without a description.
pub const UNKNOWN_STATUS: &str = "No information available for this status.";

const STATUSES: &[(&str, &str)] = &[
    (
        "Draft",
        "⚠️ The formal starting point of a HIP. The HIP is currently being drafted and is not yet ready for review.",
    ),
    (
        "Review",
        "📖 The HIP is ready for review by the community and HIP editors.",
    ),
    (
        "Last Call",
        "📢 The HIP is in a final review window, typically 14 days, before being moved to a Hiero TSC approval vote (Service, Core, Mirror or Block Node HIPs) or Active (Application HIPs).",
    ),
    (
        "Approved",
        "👍 A Standards Track HIP has been approved by Hiero TSC.",
    ),
    (
        "Final",
        "✅ A Standards Track HIP has been reviewed and approved by Hiero TSC and its reference implementation has been merged.",
    ),
    (
        "Active",
        "🌟 A Process or Informational HIP that is currently in effect.",
    ),
    (
        "Deferred",
        "⏸ A HIP that is not currently being pursued but may be revisited in the future.",
    ),
    ("Withdrawn", "🛑 Author has withdrawn the HIP."),
    (
        "Stagnant",
        "🚧 A HIP that has been inactive for a significant period (e.g., 6+ months) may be marked as Stagnant by the HIP editors.",
    ),
    (
        "Rejected",
        "❌ The HIP has been rejected by the HIP editors, the community, or a Hiero TSC vote.",
    ),
    ("Replaced", "🔄 The HIP has been replaced by a newer HIP."),
];

/// Description for a status name. Matching is exact.
pub fn describe_status(name: &str) -> &'static str {
    STATUSES
        .iter()
        .find(|(status, _)| *status == name)
        .map(|(_, description)| *description)
        .unwrap_or(UNKNOWN_STATUS)
}

/// All known status names, in lifecycle order.
pub fn status_names() -> impl Iterator<Item = &'static str> {
    STATUSES.iter().map(|(name, _)| *name)
}
