//! # Scenario Runner
//!
//! Loads a JSON scenario, drives it through a [`CustodyAccount`] and the
//! ticket it issues, and produces a serializable [`Report`].
//!
//! A scenario names everything by label: members are keypairs derived from
//! their label, assets are identified by `AssetId::from_label`. Failures do
//! not stop the run. Every rejected approval or ticket operation is recorded
//! in the report and the next step proceeds against unchanged state.
//!
//! ```json
//! {
//!   "members": ["alice", "bob", "carol"],
//!   "threshold": 2,
//!   "assets": [{ "label": "A" }, { "label": "B", "kind": "bond" }],
//!   "proposal": { "proposer": "alice", "kind": "borrow", "assets": ["A", "B"] },
//!   "approvals": ["alice", "bob"],
//!   "steps": [
//!     { "action": "borrow", "asset": "B" },
//!     { "action": "put_back", "asset": "B" },
//!     { "action": "retire" }
//!   ]
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use strongroom_contracts::CustodyAccount;
use strongroom_protocol::asset::{Asset, AssetId};
use strongroom_protocol::config::{DEFAULT_PROPOSAL_TTL, DEFAULT_VAULT_LABEL};
use strongroom_protocol::crypto::{sign, MemberKeypair};
use strongroom_protocol::ticket::{Ticket, TicketKind};
use strongroom_protocol::vault::{IncomingTransfer, MemoryVault, Vault};

use crate::metrics::SimulationMetrics;

// ---------------------------------------------------------------------------
// Scenario model
// ---------------------------------------------------------------------------

/// A complete lending episode.
#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    /// Label the vault address is derived from.
    #[serde(default = "default_vault_label")]
    pub vault: String,
    /// Member labels, in order.
    pub members: Vec<String>,
    pub threshold: usize,
    /// Assets deposited before the run starts.
    #[serde(default)]
    pub assets: Vec<AssetSpec>,
    pub proposal: ProposalSpec,
    /// Labels of members who sign the proposal, in order.
    #[serde(default)]
    pub approvals: Vec<String>,
    /// Seconds after the start of the run at which execution is attempted.
    /// Defaults to the proposal's delay.
    #[serde(default)]
    pub execute_at_secs: Option<i64>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// An asset deposited in the vault.
#[derive(Debug, Clone, Deserialize)]
pub struct AssetSpec {
    pub label: String,
    #[serde(default = "default_asset_kind")]
    pub kind: String,
}

/// The ticket proposal.
#[derive(Debug, Clone, Deserialize)]
pub struct ProposalSpec {
    pub proposer: String,
    pub kind: TicketKind,
    /// Declared asset labels, in declaration order.
    pub assets: Vec<String>,
    /// Seconds until the execution window opens.
    #[serde(default)]
    pub delay_secs: i64,
    /// Seconds from the start of the run until the window closes.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: i64,
}

/// One caller action against the issued ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Redeem the next asset of a withdraw ticket, presenting the transfer
    /// handle for `asset`.
    Redeem { asset: String },
    /// Borrow the next asset of a borrow ticket, presenting the transfer
    /// handle for `asset`.
    Borrow { asset: String },
    /// Return a held asset through the borrow ticket.
    PutBack { asset: String },
    /// Retire the ticket.
    Retire,
}

impl Step {
    fn asset(&self) -> Option<&str> {
        match self {
            Step::Redeem { asset } | Step::Borrow { asset } | Step::PutBack { asset } => {
                Some(asset)
            }
            Step::Retire => None,
        }
    }

    fn action(&self) -> &'static str {
        match self {
            Step::Redeem { .. } => "redeem",
            Step::Borrow { .. } => "borrow",
            Step::PutBack { .. } => "put_back",
            Step::Retire => "retire",
        }
    }
}

fn default_vault_label() -> String {
    DEFAULT_VAULT_LABEL.to_string()
}

fn default_asset_kind() -> String {
    "asset".to_string()
}

fn default_ttl_secs() -> i64 {
    DEFAULT_PROPOSAL_TTL.as_secs() as i64
}

impl Scenario {
    /// Reads and parses a scenario file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse scenario {}", path.display()))
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Result of one action.
#[derive(Debug, Clone, Serialize)]
pub struct Outcome {
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Outcome {
    fn ok(action: &str, subject: Option<&str>) -> Self {
        Self {
            action: action.to_string(),
            subject: subject.map(str::to_string),
            ok: true,
            error: None,
        }
    }

    fn failed(action: &str, subject: Option<&str>, error: impl ToString) -> Self {
        Self {
            action: action.to_string(),
            subject: subject.map(str::to_string),
            ok: false,
            error: Some(error.to_string()),
        }
    }
}

/// Ticket state at the end of the run. Assets are shown by label.
#[derive(Debug, Clone, Serialize)]
pub struct TicketState {
    pub kind: TicketKind,
    pub pending: Vec<String>,
    pub to_return: Vec<String>,
    pub retirable: bool,
}

/// Everything that happened during a run.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub vault: String,
    /// The proposal as the custody account recorded it.
    pub proposal: serde_json::Value,
    pub approvals: Vec<Outcome>,
    pub execution: Outcome,
    pub steps: Vec<Outcome>,
    /// `None` once retired, or if no ticket was ever issued.
    pub ticket: Option<TicketState>,
    pub retired: bool,
    /// Assets the caller is holding outside the vault.
    pub holding: Vec<String>,
    /// Assets still in custody.
    pub vault_contents: Vec<String>,
    /// Number of refused operations across approvals, execution and steps.
    pub failures: usize,
}

// ---------------------------------------------------------------------------
// Runner
// ---------------------------------------------------------------------------

/// Maps asset identifiers back to the labels the scenario used.
struct Labels(HashMap<AssetId, String>);

impl Labels {
    fn of(&self, id: AssetId) -> String {
        self.0.get(&id).cloned().unwrap_or_else(|| id.to_hex())
    }

    fn all(&self, ids: &[AssetId]) -> Vec<String> {
        ids.iter().map(|id| self.of(*id)).collect()
    }
}

/// Caller-side state while the steps run.
struct Session<'a> {
    vault: &'a MemoryVault,
    metrics: &'a SimulationMetrics,
    ticket: Option<Ticket>,
    holding: Vec<Asset>,
    retired: bool,
}

impl Session<'_> {
    fn no_ticket(&self) -> String {
        if self.retired {
            "ticket already retired".to_string()
        } else {
            "no ticket was issued".to_string()
        }
    }

    fn apply(&mut self, step: &Step) -> std::result::Result<(), String> {
        if *step == Step::Retire {
            return self.retire();
        }
        let Some(ticket) = self.ticket.as_mut() else {
            return Err(self.no_ticket());
        };

        match (step, ticket) {
            (Step::Redeem { asset }, Ticket::Withdraw(t)) => {
                let handle = IncomingTransfer::new(self.vault.address(), AssetId::from_label(asset));
                let taken = t.redeem_next(self.vault, handle).map_err(|e| e.to_string())?;
                self.metrics.assets_redeemed_total.inc();
                self.holding.push(taken);
                Ok(())
            }
            (Step::Borrow { asset }, Ticket::Borrow(t)) => {
                let handle = IncomingTransfer::new(self.vault.address(), AssetId::from_label(asset));
                let taken = t.borrow(self.vault, handle).map_err(|e| e.to_string())?;
                self.metrics.assets_redeemed_total.inc();
                self.holding.push(taken);
                Ok(())
            }
            (Step::PutBack { asset }, Ticket::Borrow(t)) => {
                let id = AssetId::from_label(asset);
                let index = self
                    .holding
                    .iter()
                    .position(|a| a.id() == id)
                    .ok_or_else(|| format!("caller does not hold {asset}"))?;
                let held = self.holding.remove(index);
                match t.put_back(self.vault, held) {
                    Ok(()) => {
                        self.metrics.assets_returned_total.inc();
                        Ok(())
                    }
                    Err(rejected) => {
                        let (asset, error) = rejected.into_parts();
                        self.holding.insert(index, asset);
                        Err(error.to_string())
                    }
                }
            }
            (step, ticket) => Err(format!(
                "{} is not available on a {} ticket",
                step.action(),
                ticket.kind()
            )),
        }
    }

    fn retire(&mut self) -> std::result::Result<(), String> {
        let Some(ticket) = self.ticket.take() else {
            return Err(self.no_ticket());
        };
        match ticket.retire() {
            Ok(()) => {
                self.retired = true;
                self.metrics.tickets_retired_total.inc();
                Ok(())
            }
            Err(rejected) => {
                let (ticket, error) = rejected.into_parts();
                self.ticket = Some(ticket);
                Err(error.to_string())
            }
        }
    }
}

/// `start` shifted by a scenario-supplied number of seconds.
fn offset(start: DateTime<Utc>, secs: i64, field: &str) -> Result<DateTime<Utc>> {
    Duration::try_seconds(secs)
        .and_then(|delta| start.checked_add_signed(delta))
        .with_context(|| format!("{field} = {secs} is out of range"))
}

/// Runs `scenario` with the run starting at `start`.
///
/// Setup problems (a bad threshold, a proposer outside the member set) are
/// errors. Everything after the proposal exists is recorded in the report.
pub fn run(scenario: &Scenario, metrics: &SimulationMetrics, start: DateTime<Utc>) -> Result<Report> {
    let vault = MemoryVault::new(&scenario.vault);
    let mut labels = HashMap::new();
    for spec in &scenario.assets {
        let asset = Asset::labelled(&spec.label, spec.kind.as_str());
        labels.insert(asset.id(), spec.label.clone());
        vault.deposit(asset);
    }
    for label in &scenario.proposal.assets {
        labels.insert(AssetId::from_label(label), label.clone());
    }
    let labels = Labels(labels);

    // Member keys are derived from labels, so a label outside the member
    // set still yields a real key that the account will refuse.
    let key_of = |label: &str| MemberKeypair::from_label(label).public_key();

    let mut account = CustodyAccount::new(
        vault,
        scenario.members.iter().map(|m| key_of(m)),
        scenario.threshold,
    )
    .context("invalid custody account")?;

    let spec = &scenario.proposal;
    let ticket = Ticket::create(
        spec.kind,
        spec.assets.iter().map(|label| AssetId::from_label(label)),
    );
    let proposal_id = account
        .propose(
            key_of(&spec.proposer),
            ticket,
            offset(start, spec.delay_secs, "delay_secs")?,
            offset(start, spec.ttl_secs, "ttl_secs")?,
        )
        .context("proposal rejected")?;

    // ---- Approvals ----
    let mut approvals = Vec::with_capacity(scenario.approvals.len());
    for signer in &scenario.approvals {
        let key = MemberKeypair::from_label(signer);
        let message = account
            .proposal(proposal_id)
            .map(|p| p.approval_message())
            .context("proposal vanished")?;
        let outcome = match account.approve(proposal_id, key.public_key(), sign(&key, &message), start) {
            Ok(_) => Outcome::ok("approve", Some(signer.as_str())),
            Err(e) => {
                metrics.rejected_operations_total.inc();
                Outcome::failed("approve", Some(signer.as_str()), e)
            }
        };
        approvals.push(outcome);
    }

    // ---- Execution ----
    let execute_at = match scenario.execute_at_secs {
        Some(secs) => offset(start, secs, "execute_at_secs")?,
        None => offset(start, spec.delay_secs, "delay_secs")?,
    };
    let (ticket, execution) = match account.execute(proposal_id, execute_at) {
        Ok(ticket) => {
            metrics.tickets_issued_total.inc();
            (Some(ticket), Outcome::ok("execute", None))
        }
        Err(e) => {
            metrics.rejected_operations_total.inc();
            (None, Outcome::failed("execute", None, e))
        }
    };

    // ---- Steps ----
    let mut session = Session {
        vault: account.vault(),
        metrics,
        ticket,
        holding: Vec::new(),
        retired: false,
    };
    let mut steps = Vec::with_capacity(scenario.steps.len());
    for step in &scenario.steps {
        let outcome = match session.apply(step) {
            Ok(()) => Outcome::ok(step.action(), step.asset()),
            Err(e) => {
                tracing::warn!(action = step.action(), error = %e, "step rejected");
                metrics.rejected_operations_total.inc();
                Outcome::failed(step.action(), step.asset(), e)
            }
        };
        steps.push(outcome);
    }

    let ticket_state = session.ticket.as_ref().map(|t| TicketState {
        kind: t.kind(),
        pending: labels.all(t.pending()),
        to_return: labels.all(t.to_return()),
        retirable: t.is_retirable(),
    });
    let holding: Vec<AssetId> = session.holding.iter().map(Asset::id).collect();
    let retired = session.retired;
    let vault_ref = session.vault;

    let failures = approvals
        .iter()
        .chain(std::iter::once(&execution))
        .chain(&steps)
        .filter(|o| !o.ok)
        .count();

    Ok(Report {
        vault: vault_ref.address().to_string(),
        proposal: serde_json::to_value(account.proposal(proposal_id))
            .context("failed to serialize proposal")?,
        approvals,
        execution,
        steps,
        ticket: ticket_state,
        retired,
        holding: labels.all(&holding),
        vault_contents: labels.all(&vault_ref.asset_ids()),
        failures,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_scenario(json: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file
    }

    fn run_json(json: &str) -> Report {
        let file = write_scenario(json);
        let scenario = Scenario::load(file.path()).unwrap();
        let metrics = SimulationMetrics::new().unwrap();
        run(&scenario, &metrics, Utc::now()).unwrap()
    }

    const BORROW_AB: &str = r#"{
        "members": ["alice", "bob", "carol"],
        "threshold": 2,
        "assets": [{ "label": "A" }, { "label": "B" }, { "label": "C" }],
        "proposal": { "proposer": "alice", "kind": "borrow", "assets": ["A", "B"] },
        "approvals": ["alice", "bob"],
        "steps": [
            { "action": "borrow", "asset": "B" },
            { "action": "borrow", "asset": "A" },
            { "action": "retire" },
            { "action": "put_back", "asset": "A" },
            { "action": "put_back", "asset": "B" },
            { "action": "retire" }
        ]
    }"#;

    #[test]
    fn borrow_episode_completes() {
        let report = run_json(BORROW_AB);
        assert!(report.execution.ok);
        assert!(report.retired);
        assert!(report.ticket.is_none());
        assert_eq!(report.failures, 1);
        assert!(!report.steps[2].ok);
        assert!(report.holding.is_empty());
        assert_eq!(report.vault_contents.len(), 3);
        assert_eq!(report.proposal["status"], "Executed");
    }

    #[test]
    fn out_of_order_redeem_is_recorded_and_run_continues() {
        let report = run_json(
            r#"{
                "members": ["alice"],
                "threshold": 1,
                "assets": [{ "label": "A" }, { "label": "B" }],
                "proposal": { "proposer": "alice", "kind": "withdraw", "assets": ["A", "B"] },
                "approvals": ["alice"],
                "steps": [
                    { "action": "redeem", "asset": "A" },
                    { "action": "redeem", "asset": "B" }
                ]
            }"#,
        );
        assert!(!report.steps[0].ok);
        assert!(report.steps[0]
            .error
            .as_deref()
            .unwrap()
            .contains("mismatched asset"));
        assert!(report.steps[1].ok);

        let ticket = report.ticket.unwrap();
        assert_eq!(ticket.pending, vec!["A".to_string()]);
        assert_eq!(report.holding, vec!["B".to_string()]);
        assert_eq!(report.vault_contents, vec!["A".to_string()]);
    }

    #[test]
    fn insufficient_approvals_issue_nothing() {
        let report = run_json(
            r#"{
                "members": ["alice", "bob"],
                "threshold": 2,
                "assets": [{ "label": "A" }],
                "proposal": { "proposer": "alice", "kind": "withdraw", "assets": ["A"] },
                "approvals": ["alice", "mallory"],
                "steps": [{ "action": "redeem", "asset": "A" }]
            }"#,
        );
        assert!(report.approvals[0].ok);
        assert!(!report.approvals[1].ok);
        assert!(!report.execution.ok);
        assert_eq!(
            report.steps[0].error.as_deref(),
            Some("no ticket was issued")
        );
        assert_eq!(report.failures, 3);
        assert_eq!(report.vault_contents, vec!["A".to_string()]);
    }

    #[test]
    fn action_must_match_ticket_kind() {
        let report = run_json(
            r#"{
                "members": ["alice"],
                "threshold": 1,
                "assets": [{ "label": "A" }],
                "proposal": { "proposer": "alice", "kind": "withdraw", "assets": ["A"] },
                "approvals": ["alice"],
                "steps": [
                    { "action": "borrow", "asset": "A" },
                    { "action": "redeem", "asset": "A" },
                    { "action": "retire" },
                    { "action": "retire" }
                ]
            }"#,
        );
        let oks: Vec<bool> = report.steps.iter().map(|s| s.ok).collect();
        assert_eq!(oks, vec![false, true, true, false]);
        assert_eq!(
            report.steps[3].error.as_deref(),
            Some("ticket already retired")
        );
    }

    #[test]
    fn bad_threshold_is_a_setup_error() {
        let file = write_scenario(
            r#"{
                "members": ["alice"],
                "threshold": 2,
                "proposal": { "proposer": "alice", "kind": "withdraw", "assets": [] }
            }"#,
        );
        let scenario = Scenario::load(file.path()).unwrap();
        let metrics = SimulationMetrics::new().unwrap();
        assert!(run(&scenario, &metrics, Utc::now()).is_err());
    }

    #[test]
    fn out_of_range_seconds_are_a_setup_error() {
        let metrics = SimulationMetrics::new().unwrap();
        for (field, json) in [
            (
                "ttl_secs",
                r#"{
                    "members": ["alice"],
                    "threshold": 1,
                    "proposal": { "proposer": "alice", "kind": "withdraw", "assets": [],
                                  "ttl_secs": 9223372036854775807 }
                }"#,
            ),
            (
                "delay_secs",
                r#"{
                    "members": ["alice"],
                    "threshold": 1,
                    "proposal": { "proposer": "alice", "kind": "withdraw", "assets": [],
                                  "delay_secs": -9223372036854775808 }
                }"#,
            ),
            (
                "execute_at_secs",
                r#"{
                    "members": ["alice"],
                    "threshold": 1,
                    "proposal": { "proposer": "alice", "kind": "withdraw", "assets": [] },
                    "execute_at_secs": 9223372036854775807
                }"#,
            ),
        ] {
            let file = write_scenario(json);
            let scenario = Scenario::load(file.path()).unwrap();
            let err = run(&scenario, &metrics, Utc::now()).unwrap_err();
            assert!(format!("{err:#}").contains(field), "{field}: {err:#}");
        }
    }

    #[test]
    fn malformed_scenario_fails_to_load() {
        let file = write_scenario(r#"{ "members": "alice" }"#);
        assert!(Scenario::load(file.path()).is_err());
    }

    #[test]
    fn metrics_track_the_episode() {
        let file = write_scenario(BORROW_AB);
        let scenario = Scenario::load(file.path()).unwrap();
        let metrics = SimulationMetrics::new().unwrap();
        run(&scenario, &metrics, Utc::now()).unwrap();

        assert_eq!(metrics.tickets_issued_total.get(), 1);
        assert_eq!(metrics.assets_redeemed_total.get(), 2);
        assert_eq!(metrics.assets_returned_total.get(), 2);
        assert_eq!(metrics.tickets_retired_total.get(), 1);
        assert_eq!(metrics.rejected_operations_total.get(), 1);
    }

    #[test]
    fn shipped_scenarios_finish_retired() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("scenarios");
        for name in ["borrow.json", "withdraw.json"] {
            let scenario = Scenario::load(&dir.join(name)).unwrap();
            let metrics = SimulationMetrics::new().unwrap();
            let report = run(&scenario, &metrics, Utc::now()).unwrap();
            assert!(report.retired, "{name} did not retire");
            assert_eq!(report.failures, 1, "{name}");
        }
    }
}
