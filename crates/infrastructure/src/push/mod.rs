mod http_push_provider;

pub use http_push_provider::HttpPushProvider;
