#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use lineup_dispatcher::selector::DispatchSelector;
    use lineup_domain::LeadStatus;
    use lineup_testing_utils::builders::{CloserBuilder, LeadBuilder};
    use lineup_testing_utils::mocks::{MockCloserRepository, MockLeadRepository};

    fn selector(
        closers: Vec<lineup_domain::Closer>,
        leads: Vec<lineup_domain::Lead>,
    ) -> DispatchSelector {
        DispatchSelector::new(
            Arc::new(MockCloserRepository::with_closers(closers)),
            Arc::new(MockLeadRepository::with_leads(leads)),
        )
    }

    #[tokio::test]
    async fn test_select_next_picks_lowest_order() {
        let closers = vec![
            CloserBuilder::new().with_id("c-1").with_order(2000).build(),
            CloserBuilder::new().with_id("c-2").with_order(1000).build(),
            CloserBuilder::new().with_id("c-3").with_order(3000).build(),
        ];
        let selector = selector(closers, vec![]);

        let next = selector.select_next("team-1").await.unwrap().unwrap();
        assert_eq!(next.id, "c-2");
    }

    #[tokio::test]
    async fn test_missing_order_sorts_last() {
        let closers = vec![
            CloserBuilder::new().with_id("c-new").build(),
            CloserBuilder::new().with_id("c-old").with_order(5000).build(),
        ];
        let selector = selector(closers, vec![]);

        let candidates = selector.available_candidates("team-1").await.unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].closer.id, "c-old");
        assert_eq!(candidates[1].closer.id, "c-new");
    }

    #[tokio::test]
    async fn test_off_duty_closers_excluded() {
        let closers = vec![
            CloserBuilder::new()
                .with_id("c-1")
                .with_order(1000)
                .off_duty()
                .build(),
            CloserBuilder::new().with_id("c-2").with_order(2000).build(),
        ];
        let selector = selector(closers, vec![]);

        let next = selector.select_next("team-1").await.unwrap().unwrap();
        assert_eq!(next.id, "c-2");
    }

    #[tokio::test]
    async fn test_busy_closer_excluded() {
        let closers = vec![
            CloserBuilder::new().with_id("c-1").with_order(1000).build(),
            CloserBuilder::new().with_id("c-2").with_order(2000).build(),
        ];
        let leads = vec![LeadBuilder::new()
            .with_id("lead-1")
            .with_status(LeadStatus::InProcess)
            .assigned_to("c-1", "Closer One")
            .build()];
        let selector = selector(closers, leads);

        let next = selector.select_next("team-1").await.unwrap().unwrap();
        assert_eq!(next.id, "c-2");
    }

    #[tokio::test]
    async fn test_unverified_appointment_does_not_block_closer() {
        let closers = vec![CloserBuilder::new().with_id("c-1").with_order(1000).build()];
        // an unverified appointment hangs on the closer but consumes no slot
        let leads = vec![LeadBuilder::new()
            .with_id("lead-1")
            .scheduled_in_minutes(120)
            .assigned_to("c-1", "Closer One")
            .build()];
        let selector = selector(closers, leads);

        let next = selector.select_next("team-1").await.unwrap();
        assert_eq!(next.unwrap().id, "c-1");
    }

    #[tokio::test]
    async fn test_verified_appointment_blocks_closer() {
        let closers = vec![CloserBuilder::new().with_id("c-1").with_order(1000).build()];
        let leads = vec![LeadBuilder::new()
            .with_id("lead-1")
            .scheduled_in_minutes(120)
            .verified()
            .assigned_to("c-1", "Closer One")
            .build()];
        let selector = selector(closers, leads);

        assert!(selector.select_next("team-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_select_next_empty_team() {
        let selector = selector(vec![], vec![]);
        assert!(selector.select_next("team-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_name_breaks_order_ties() {
        let closers = vec![
            CloserBuilder::new()
                .with_id("c-b")
                .with_name("Bob")
                .with_order(1000)
                .build(),
            CloserBuilder::new()
                .with_id("c-a")
                .with_name("Alice")
                .with_order(1000)
                .build(),
        ];
        let selector = selector(closers, vec![]);

        let next = selector.select_next("team-1").await.unwrap().unwrap();
        assert_eq!(next.id, "c-a");
    }

    #[tokio::test]
    async fn test_team_lineup_includes_busy_closers() {
        let closers = vec![
            CloserBuilder::new().with_id("c-1").with_order(1000).build(),
            CloserBuilder::new().with_id("c-2").with_order(2000).build(),
        ];
        let leads = vec![LeadBuilder::new()
            .with_id("lead-1")
            .with_status(LeadStatus::Accepted)
            .assigned_to("c-1", "Closer One")
            .build()];
        let selector = selector(closers, leads);

        let lineup = selector.team_lineup("team-1").await.unwrap();
        assert_eq!(lineup.len(), 2);
        let busy = lineup.iter().find(|c| c.closer.id == "c-1").unwrap();
        assert_eq!(busy.live_count, 1);
    }
}
