#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use lineup_dispatcher::assignment::AssignmentService;
    use lineup_dispatcher::fanout::NotificationFanout;
    use lineup_domain::{ActivityKind, LeadStatus};
    use lineup_testing_utils::builders::{CloserBuilder, LeadBuilder};
    use lineup_testing_utils::mocks::{
        MockActivityRepository, MockDeviceTokenRepository, MockLeadRepository, MockPushProvider,
    };

    struct Stack {
        lead_repo: Arc<MockLeadRepository>,
        activity_repo: Arc<MockActivityRepository>,
        provider: Arc<MockPushProvider>,
        service: AssignmentService,
    }

    fn stack() -> Stack {
        let lead_repo = Arc::new(MockLeadRepository::new());
        let activity_repo = Arc::new(MockActivityRepository::new());
        let token_repo = Arc::new(MockDeviceTokenRepository::with_tokens(vec![(
            "c-1", "token-1",
        )]));
        let provider = Arc::new(MockPushProvider::new());
        let fanout = Arc::new(NotificationFanout::new(
            token_repo,
            provider.clone(),
            Duration::from_secs(5),
        ));
        let service = AssignmentService::new(lead_repo.clone(), activity_repo.clone(), fanout);
        Stack {
            lead_repo,
            activity_repo,
            provider,
            service,
        }
    }

    #[tokio::test]
    async fn test_assign_immediate_lead() {
        let stack = stack();
        let lead = LeadBuilder::new().build();
        stack.lead_repo.insert(lead.clone());
        let closer = CloserBuilder::new().with_id("c-1").build();

        let assigned = stack.service.assign(lead, &closer).await.unwrap();

        assert_eq!(assigned.assigned_closer_id.as_deref(), Some("c-1"));
        assert_eq!(assigned.status, LeadStatus::WaitingAssignment);

        let stored = stack.lead_repo.get_all().pop().unwrap();
        assert_eq!(stored.assigned_closer_id.as_deref(), Some("c-1"));
    }

    #[tokio::test]
    async fn test_assign_unverified_appointment_keeps_status() {
        let stack = stack();
        let lead = LeadBuilder::new().scheduled_in_minutes(120).build();
        stack.lead_repo.insert(lead.clone());
        let closer = CloserBuilder::new().with_id("c-1").build();

        let assigned = stack.service.assign(lead, &closer).await.unwrap();

        // bound but not promoted until the appointment is verified
        assert_eq!(assigned.assigned_closer_id.as_deref(), Some("c-1"));
        assert_eq!(assigned.status, LeadStatus::Scheduled);
    }

    #[tokio::test]
    async fn test_assign_verified_appointment_promotes() {
        let stack = stack();
        let lead = LeadBuilder::new()
            .scheduled_in_minutes(120)
            .verified()
            .build();
        stack.lead_repo.insert(lead.clone());
        let closer = CloserBuilder::new().with_id("c-1").build();

        let assigned = stack.service.assign(lead, &closer).await.unwrap();
        assert_eq!(assigned.status, LeadStatus::WaitingAssignment);
    }

    #[tokio::test]
    async fn test_assign_writes_audit_and_notifies() {
        let stack = stack();
        let lead = LeadBuilder::new().build();
        stack.lead_repo.insert(lead.clone());
        let closer = CloserBuilder::new().with_id("c-1").build();

        stack.service.assign(lead, &closer).await.unwrap();

        let assigned = stack.activity_repo.of_kind(ActivityKind::LeadAssigned);
        assert_eq!(assigned.len(), 1);
        assert_eq!(assigned[0].closer_id.as_deref(), Some("c-1"));

        // notification goes out on a background task
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(stack.provider.sent_count(), 1);
        let sent = stack.provider.sent().pop().unwrap();
        assert_eq!(sent.tokens, vec!["token-1".to_string()]);
    }
}
