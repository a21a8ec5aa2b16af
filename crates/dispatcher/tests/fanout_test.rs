#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use lineup_dispatcher::fanout::NotificationFanout;
    use lineup_domain::PushPayload;
    use lineup_testing_utils::mocks::{MockDeviceTokenRepository, MockPushProvider};

    fn fanout(
        token_repo: &Arc<MockDeviceTokenRepository>,
        provider: &Arc<MockPushProvider>,
    ) -> NotificationFanout {
        NotificationFanout::new(token_repo.clone(), provider.clone(), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_notify_without_tokens_is_noop() {
        let token_repo = Arc::new(MockDeviceTokenRepository::new());
        let provider = Arc::new(MockPushProvider::new());
        let fanout = fanout(&token_repo, &provider);

        let payload = PushPayload::new("title", "body");
        fanout
            .notify(&["c-1".to_string()], &payload)
            .await
            .unwrap();
        assert_eq!(provider.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_notify_collects_tokens_across_recipients() {
        let token_repo = Arc::new(MockDeviceTokenRepository::with_tokens(vec![
            ("c-1", "t-1"),
            ("c-2", "t-2"),
            ("c-2", "t-3"),
        ]));
        let provider = Arc::new(MockPushProvider::new());
        let fanout = fanout(&token_repo, &provider);

        let payload = PushPayload::new("title", "body");
        fanout
            .notify(&["c-1".to_string(), "c-2".to_string()], &payload)
            .await
            .unwrap();

        let sent = provider.sent().pop().unwrap();
        assert_eq!(sent.tokens.len(), 3);
    }

    #[tokio::test]
    async fn test_invalid_tokens_are_pruned() {
        let token_repo = Arc::new(MockDeviceTokenRepository::with_tokens(vec![
            ("c-1", "t-good"),
            ("c-1", "t-dead"),
        ]));
        let provider = Arc::new(MockPushProvider::new());
        provider.mark_invalid("t-dead");
        let fanout = fanout(&token_repo, &provider);

        let payload = PushPayload::new("title", "body");
        fanout
            .notify(&["c-1".to_string()], &payload)
            .await
            .unwrap();

        let remaining = token_repo.all_tokens();
        assert_eq!(remaining, vec!["t-good".to_string()]);
    }

    #[tokio::test]
    async fn test_provider_failure_surfaces_as_error() {
        let token_repo = Arc::new(MockDeviceTokenRepository::with_tokens(vec![("c-1", "t-1")]));
        let provider = Arc::new(MockPushProvider::new());
        provider.fail_next();
        let fanout = fanout(&token_repo, &provider);

        let payload = PushPayload::new("title", "body");
        let result = fanout.notify(&["c-1".to_string()], &payload).await;
        assert!(result.is_err());
    }
}
