use biometrics::{Collector, Counter, Moments};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("koine.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter = Counter::new("koine.client.request_errors");
pub(crate) static CLIENT_REQUEST_RETRIES: Counter = Counter::new("koine.client.retries");
pub(crate) static CLIENT_UNAUTHORIZED: Counter = Counter::new("koine.client.unauthorized");
pub(crate) static CLIENT_REQUEST_DURATION: Moments =
    Moments::new("koine.client.request_duration_seconds");
pub(crate) static CLIENT_RETRY_BACKOFF: Moments =
    Moments::new("koine.client.retry_backoff_seconds");

pub(crate) static CHANNEL_CONNECTS: Counter = Counter::new("koine.channel.connects");
pub(crate) static CHANNEL_DISCONNECTS: Counter = Counter::new("koine.channel.disconnects");
pub(crate) static CHANNEL_FRAMES: Counter = Counter::new("koine.channel.frames");
pub(crate) static CHANNEL_MALFORMED_FRAMES: Counter =
    Counter::new("koine.channel.malformed_frames");
pub(crate) static CHANNEL_SENDS: Counter = Counter::new("koine.channel.sends");
pub(crate) static CHANNEL_DROPPED_SENDS: Counter = Counter::new("koine.channel.dropped_sends");

pub(crate) static SESSION_SAVES: Counter = Counter::new("koine.session.saves");
pub(crate) static SESSION_SAVE_ERRORS: Counter = Counter::new("koine.session.save_errors");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_counter(&CLIENT_REQUEST_RETRIES);
    collector.register_counter(&CLIENT_UNAUTHORIZED);
    collector.register_moments(&CLIENT_REQUEST_DURATION);
    collector.register_moments(&CLIENT_RETRY_BACKOFF);

    collector.register_counter(&CHANNEL_CONNECTS);
    collector.register_counter(&CHANNEL_DISCONNECTS);
    collector.register_counter(&CHANNEL_FRAMES);
    collector.register_counter(&CHANNEL_MALFORMED_FRAMES);
    collector.register_counter(&CHANNEL_SENDS);
    collector.register_counter(&CHANNEL_DROPPED_SENDS);

    collector.register_counter(&SESSION_SAVES);
    collector.register_counter(&SESSION_SAVE_ERRORS);
}
