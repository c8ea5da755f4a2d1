//! Pipeline board: leads grouped by stage, moved by drag and drop.

use std::sync::Arc;

use paveos_api::{Lead, LeadQuery, LeadService, LeadStatus, LeadUpdate};
use tracing::{info, warn};

use crate::error::{Result, ViewError};
use crate::notify::Notifier;

/// One board column.
#[derive(Debug, Clone, PartialEq)]
pub struct StageColumn<'a> {
    pub stage: LeadStatus,
    pub leads: Vec<&'a Lead>,
    /// Sum of estimated values in this column.
    pub total_value: f64,
}

/// The board partition of the current lead list.
#[derive(Debug, Clone, PartialEq)]
pub struct Board<'a> {
    /// The six stages, in display order.
    pub columns: Vec<StageColumn<'a>>,
    /// Leads whose status matches no stage. These are data defects.
    pub unmapped: Vec<&'a Lead>,
}

/// Result of a drop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    /// Dropped onto its own stage; nothing was sent.
    Unchanged,
    Moved { from: LeadStatus, to: LeadStatus },
}

/// Headline numbers derived from the lead list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineMetrics {
    pub total_leads: usize,
    /// Leads not yet won or lost.
    pub active_count: usize,
    pub active_value: f64,
    pub won_count: usize,
    /// Actual value of won leads, falling back to the estimate.
    pub won_value: f64,
    pub average_active_value: f64,
    /// Whole percent of all leads that were won.
    pub win_rate: u32,
}

pub struct PipelineBoard {
    service: Arc<dyn LeadService>,
    notifier: Notifier,
    leads: Vec<Lead>,
}

impl PipelineBoard {
    pub fn new(service: Arc<dyn LeadService>, notifier: Notifier) -> Self {
        Self {
            service,
            notifier,
            leads: Vec::new(),
        }
    }

    /// Replace the lead list from the backend. On failure the current list
    /// is kept.
    pub async fn load(&mut self) -> Result<()> {
        match self.service.list_leads(&LeadQuery::default()).await {
            Ok(list) => {
                self.leads = list.leads;
                info!(leads = self.leads.len(), "Loaded pipeline");
                Ok(())
            }
            Err(e) => {
                self.notifier.error(e.user_message());
                Err(e.into())
            }
        }
    }

    pub fn leads(&self) -> &[Lead] {
        &self.leads
    }

    pub fn set_leads(&mut self, leads: Vec<Lead>) {
        self.leads = leads;
    }

    /// Partition the current list into stage columns.
    pub fn columns(&self) -> Board<'_> {
        let columns = LeadStatus::STAGES
            .into_iter()
            .map(|stage| {
                let leads: Vec<&Lead> = self.leads.iter().filter(|l| l.status == stage).collect();
                let total_value = leads.iter().map(|l| l.estimated_or_zero()).sum();
                StageColumn {
                    stage,
                    leads,
                    total_value,
                }
            })
            .collect();

        let unmapped: Vec<&Lead> = self.leads.iter().filter(|l| !l.status.is_known()).collect();
        for lead in &unmapped {
            warn!(
                lead_id = %lead.id,
                status = %lead.status,
                "Lead has a status outside the pipeline stages"
            );
        }

        Board { columns, unmapped }
    }

    /// Move a lead to `target`.
    ///
    /// The list changes only after the backend confirms the update.
    pub async fn drop_lead(&mut self, lead_id: &str, target: LeadStatus) -> Result<DropOutcome> {
        if !target.is_known() {
            return Err(ViewError::Validation(format!("Unknown stage: {target}")));
        }
        let index = self
            .leads
            .iter()
            .position(|l| l.id == lead_id)
            .ok_or_else(|| ViewError::NotFound {
                entity: "Lead",
                id: lead_id.to_string(),
            })?;

        let from = self.leads[index].status.clone();
        if from == target {
            return Ok(DropOutcome::Unchanged);
        }

        match self
            .service
            .update_lead(lead_id, &LeadUpdate::status(target.clone()))
            .await
        {
            Ok(updated) => {
                let lead = &mut self.leads[index];
                *lead = updated;
                lead.status = target.clone();
                info!(lead_id, from = %from, to = %target, "Lead moved");
                self.notifier
                    .success(format!("Lead moved to {}!", target.display_name()));
                Ok(DropOutcome::Moved { from, to: target })
            }
            Err(e) => {
                warn!(lead_id, error = %e, "Failed to move lead");
                self.notifier.error(e.user_message());
                Err(e.into())
            }
        }
    }

    /// Recomputed from the current list on every call.
    pub fn metrics(&self) -> PipelineMetrics {
        pipeline_metrics(&self.leads)
    }
}

impl std::fmt::Debug for PipelineBoard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineBoard")
            .field("leads", &self.leads.len())
            .finish()
    }
}

pub fn pipeline_metrics(leads: &[Lead]) -> PipelineMetrics {
    let active: Vec<&Lead> = leads.iter().filter(|l| !l.status.is_terminal()).collect();
    let won: Vec<&Lead> = leads.iter().filter(|l| l.status == LeadStatus::Won).collect();

    let active_value: f64 = active.iter().map(|l| l.estimated_or_zero()).sum();
    let won_value: f64 = won.iter().map(|l| l.realised_value()).sum();
    let average_active_value = if active.is_empty() {
        0.0
    } else {
        active_value / active.len() as f64
    };
    let win_rate = if leads.is_empty() {
        0
    } else {
        (won.len() as f64 / leads.len() as f64 * 100.0).round() as u32
    };

    PipelineMetrics {
        total_leads: leads.len(),
        active_count: active.len(),
        active_value,
        won_count: won.len(),
        won_value,
        average_active_value,
        win_rate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::Notification;
    use crate::testing::{lead, FakeBackend};

    fn board_with(backend: &Arc<FakeBackend>) -> (PipelineBoard, tokio::sync::mpsc::UnboundedReceiver<Notification>) {
        let (notifier, rx) = Notifier::channel();
        (PipelineBoard::new(backend.clone(), notifier), rx)
    }

    fn sample() -> Vec<Lead> {
        let mut won = lead("W1", LeadStatus::Won, Some(1000.0));
        won.actual_value = Some(1200.0);
        vec![
            lead("L1", LeadStatus::New, Some(100.0)),
            lead("L2", LeadStatus::Proposal, Some(300.0)),
            lead("L3", LeadStatus::Proposal, None),
            won,
            lead("W2", LeadStatus::Won, Some(400.0)),
            lead("X1", LeadStatus::Lost, Some(50.0)),
        ]
    }

    #[tokio::test]
    async fn test_columns_partition_in_stage_order() {
        let backend = Arc::new(FakeBackend::with_leads(sample()));
        let (mut board, _rx) = board_with(&backend);
        board.load().await.unwrap();

        let view = board.columns();
        let stages: Vec<LeadStatus> = view.columns.iter().map(|c| c.stage.clone()).collect();
        assert_eq!(stages, LeadStatus::STAGES.to_vec());

        let proposal = &view.columns[2];
        assert_eq!(proposal.leads.len(), 2);
        assert_eq!(proposal.total_value, 300.0);
        assert!(view.columns[1].leads.is_empty());
        assert!(view.unmapped.is_empty());
    }

    #[test]
    fn test_unknown_status_is_surfaced_not_dropped() {
        let mut board = PipelineBoard::new(Arc::new(FakeBackend::default()), Notifier::silent());
        board.set_leads(vec![
            lead("L1", LeadStatus::New, None),
            lead("Q1", LeadStatus::from("qualified".to_string()), None),
        ]);

        let view = board.columns();
        let placed: usize = view.columns.iter().map(|c| c.leads.len()).sum();
        assert_eq!(placed, 1);
        assert_eq!(view.unmapped.len(), 1);
        assert_eq!(view.unmapped[0].id, "Q1");
    }

    #[tokio::test]
    async fn test_drop_on_same_stage_sends_nothing() {
        let backend = Arc::new(FakeBackend::with_leads(sample()));
        let (mut board, mut rx) = board_with(&backend);
        board.load().await.unwrap();
        let before = board.leads().to_vec();

        let outcome = board.drop_lead("L2", LeadStatus::Proposal).await.unwrap();

        assert_eq!(outcome, DropOutcome::Unchanged);
        assert!(backend.update_calls.lock().is_empty());
        assert_eq!(board.leads(), before.as_slice());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_drop_moves_lead_after_confirmation() {
        let backend = Arc::new(FakeBackend::with_leads(vec![lead("L1", LeadStatus::New, None)]));
        let (mut board, mut rx) = board_with(&backend);
        board.load().await.unwrap();

        let outcome = board.drop_lead("L1", LeadStatus::Proposal).await.unwrap();

        assert_eq!(
            outcome,
            DropOutcome::Moved {
                from: LeadStatus::New,
                to: LeadStatus::Proposal
            }
        );
        assert_eq!(board.leads()[0].status, LeadStatus::Proposal);
        assert_eq!(
            *backend.update_calls.lock(),
            vec![("L1".to_string(), LeadUpdate::status(LeadStatus::Proposal))]
        );
        let notification = rx.try_recv().unwrap();
        assert_eq!(notification, Notification::success("Lead moved to Proposal!"));
        assert!(notification.message.contains("Proposal"));
    }

    #[tokio::test]
    async fn test_failed_drop_leaves_lead_in_place() {
        let backend = Arc::new(FakeBackend::with_leads(sample()));
        *backend.fail_updates.lock() = true;
        let (mut board, mut rx) = board_with(&backend);
        board.load().await.unwrap();

        let result = board.drop_lead("L1", LeadStatus::Negotiation).await;

        assert!(result.is_err());
        assert_eq!(board.leads()[0].status, LeadStatus::New);
        assert_eq!(backend.update_calls.lock().len(), 1);
        assert_eq!(rx.try_recv().unwrap(), Notification::error("boom"));
    }

    #[tokio::test]
    async fn test_drop_rejects_unknown_lead_and_stage() {
        let backend = Arc::new(FakeBackend::with_leads(sample()));
        let (mut board, _rx) = board_with(&backend);
        board.load().await.unwrap();

        assert!(matches!(
            board.drop_lead("nope", LeadStatus::Won).await,
            Err(ViewError::NotFound { .. })
        ));
        assert!(matches!(
            board
                .drop_lead("L1", LeadStatus::from("archived".to_string()))
                .await,
            Err(ViewError::Validation(_))
        ));
        assert!(backend.update_calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_failed_load_keeps_list() {
        let backend = Arc::new(FakeBackend::with_leads(sample()));
        let (mut board, mut rx) = board_with(&backend);
        board.load().await.unwrap();

        *backend.fail_list.lock() = true;
        assert!(board.load().await.is_err());
        assert_eq!(board.leads().len(), 6);
        assert_eq!(rx.try_recv().unwrap(), Notification::error("boom"));
    }

    #[test]
    fn test_metrics() {
        let metrics = pipeline_metrics(&sample());

        assert_eq!(metrics.total_leads, 6);
        assert_eq!(metrics.active_count, 3);
        assert_eq!(metrics.active_value, 400.0);
        assert_eq!(metrics.won_count, 2);
        assert_eq!(metrics.won_value, 1600.0);
        assert!((metrics.average_active_value - 133.333).abs() < 0.001);
        // 2 of 6 won.
        assert_eq!(metrics.win_rate, 33);
    }

    #[test]
    fn test_metrics_on_empty_list() {
        let metrics = pipeline_metrics(&[]);
        assert_eq!(metrics.win_rate, 0);
        assert_eq!(metrics.average_active_value, 0.0);
    }

    #[tokio::test]
    async fn test_metrics_follow_moves() {
        let backend = Arc::new(FakeBackend::with_leads(sample()));
        let (mut board, _rx) = board_with(&backend);
        board.load().await.unwrap();

        board.drop_lead("L1", LeadStatus::Won).await.unwrap();
        let metrics = board.metrics();
        assert_eq!(metrics.won_count, 3);
        assert_eq!(metrics.win_rate, 50);
        assert_eq!(metrics.active_value, 300.0);
    }
}
