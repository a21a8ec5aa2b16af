#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use chrono::{Duration as ChronoDuration, Utc};
    use lineup_core::config::VerificationConfig;
    use lineup_dispatcher::fanout::NotificationFanout;
    use lineup_dispatcher::{AssignmentService, DispatchSelector, VerificationService};
    use lineup_domain::{ActivityKind, LeadRepository, LeadStatus};
    use lineup_testing_utils::builders::{CloserBuilder, LeadBuilder};
    use lineup_testing_utils::mocks::{
        MockActivityRepository, MockCloserRepository, MockDeviceTokenRepository,
        MockLeadRepository, MockPushProvider,
    };

    struct Stack {
        lead_repo: Arc<MockLeadRepository>,
        closer_repo: Arc<MockCloserRepository>,
        activity_repo: Arc<MockActivityRepository>,
        service: VerificationService,
    }

    fn stack() -> Stack {
        let lead_repo = Arc::new(MockLeadRepository::new());
        let closer_repo = Arc::new(MockCloserRepository::new());
        let activity_repo = Arc::new(MockActivityRepository::new());
        let token_repo = Arc::new(MockDeviceTokenRepository::new());
        let provider = Arc::new(MockPushProvider::new());
        let fanout = Arc::new(NotificationFanout::new(
            token_repo,
            provider,
            Duration::from_secs(5),
        ));
        let selector = Arc::new(DispatchSelector::new(
            closer_repo.clone(),
            lead_repo.clone(),
        ));
        let assignment = Arc::new(AssignmentService::new(
            lead_repo.clone(),
            activity_repo.clone(),
            fanout,
        ));
        let service = VerificationService::new(
            lead_repo.clone(),
            activity_repo.clone(),
            selector,
            assignment,
            VerificationConfig::default(),
        );
        Stack {
            lead_repo,
            closer_repo,
            activity_repo,
            service,
        }
    }

    #[tokio::test]
    async fn test_unverified_appointment_canceled_after_grace() {
        let stack = stack();
        // appointment 20 minutes ago, never verified (10 minute grace)
        let lead = LeadBuilder::new()
            .with_id("lead-1")
            .scheduled_at(Utc::now() - ChronoDuration::minutes(20))
            .build();
        stack.lead_repo.insert(lead);

        let report = stack.service.sweep_all().await.unwrap();
        assert_eq!(report.canceled, 1);

        let stored = stack.lead_repo.get_all().pop().unwrap();
        assert_eq!(stored.status, LeadStatus::Canceled);
        assert_eq!(
            stack
                .activity_repo
                .of_kind(ActivityKind::VerificationTimeout)
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn test_unverified_appointment_within_grace_untouched() {
        let stack = stack();
        let lead = LeadBuilder::new()
            .with_id("lead-1")
            .scheduled_at(Utc::now() - ChronoDuration::minutes(5))
            .build();
        stack.lead_repo.insert(lead);

        let report = stack.service.sweep_all().await.unwrap();
        assert_eq!(report.canceled, 0);
        let stored = stack.lead_repo.get_all().pop().unwrap();
        assert_eq!(stored.status, LeadStatus::Scheduled);
    }

    #[tokio::test]
    async fn test_verified_appointment_expires_when_unworked() {
        let stack = stack();
        // verified but nobody worked it for 20 minutes past the appointment
        let lead = LeadBuilder::new()
            .with_id("lead-1")
            .scheduled_at(Utc::now() - ChronoDuration::minutes(20))
            .verified()
            .assigned_to("c-1", "One")
            .build();
        stack.lead_repo.insert(lead);

        let report = stack.service.sweep_all().await.unwrap();
        assert_eq!(report.expired, 1);
        let stored = stack.lead_repo.get_all().pop().unwrap();
        assert_eq!(stored.status, LeadStatus::Expired);
    }

    #[tokio::test]
    async fn test_verified_appointment_promoted_in_claim_window() {
        let stack = stack();
        stack
            .closer_repo
            .insert(CloserBuilder::new().with_id("c-1").with_order(1000).build());
        // 30 minutes out, inside the 45 minute early-claim window
        let lead = LeadBuilder::new()
            .with_id("lead-1")
            .scheduled_at(Utc::now() + ChronoDuration::minutes(30))
            .verified()
            .build();
        stack.lead_repo.insert(lead);

        let report = stack.service.sweep_all().await.unwrap();
        assert_eq!(report.promoted, 1);

        let stored = stack.lead_repo.get_all().pop().unwrap();
        assert_eq!(stored.status, LeadStatus::WaitingAssignment);
        assert_eq!(stored.assigned_closer_id.as_deref(), Some("c-1"));
    }

    #[tokio::test]
    async fn test_promotion_without_capacity_escalates() {
        let stack = stack();
        let lead = LeadBuilder::new()
            .with_id("lead-1")
            .scheduled_at(Utc::now() + ChronoDuration::minutes(30))
            .verified()
            .build();
        stack.lead_repo.insert(lead);

        let report = stack.service.sweep_all().await.unwrap();
        assert_eq!(report.promoted, 1);

        let stored = stack.lead_repo.get_all().pop().unwrap();
        assert_eq!(stored.status, LeadStatus::WaitingAssignment);
        assert!(stored.assigned_closer_id.is_none());
        assert_eq!(
            stack
                .activity_repo
                .of_kind(ActivityKind::DispatchEscalated)
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn test_verified_appointment_outside_window_untouched() {
        let stack = stack();
        let lead = LeadBuilder::new()
            .with_id("lead-1")
            .scheduled_at(Utc::now() + ChronoDuration::minutes(120))
            .verified()
            .build();
        stack.lead_repo.insert(lead);

        let report = stack.service.sweep_all().await.unwrap();
        assert_eq!(report.promoted, 0);
        let stored = stack.lead_repo.get_all().pop().unwrap();
        assert_eq!(stored.status, LeadStatus::Scheduled);
    }

    #[tokio::test]
    async fn test_sweep_team_scopes_to_one_team() {
        let stack = stack();
        stack.lead_repo.insert(
            LeadBuilder::new()
                .with_id("lead-a")
                .with_team("team-a")
                .scheduled_at(Utc::now() - ChronoDuration::minutes(20))
                .build(),
        );
        stack.lead_repo.insert(
            LeadBuilder::new()
                .with_id("lead-b")
                .with_team("team-b")
                .scheduled_at(Utc::now() - ChronoDuration::minutes(20))
                .build(),
        );

        let report = stack.service.sweep_team("team-a").await.unwrap();
        assert_eq!(report.canceled, 1);

        let untouched = stack
            .lead_repo
            .get_by_id("lead-b")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(untouched.status, LeadStatus::Scheduled);
    }
}
