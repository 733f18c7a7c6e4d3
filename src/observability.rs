use biometrics::{Collector, Counter, Moments};

pub(crate) static COMPLETION_REQUESTS: Counter = Counter::new("sesame.completion.requests");
pub(crate) static COMPLETION_ERRORS: Counter = Counter::new("sesame.completion.errors");
pub(crate) static COMPLETION_DURATION: Moments =
    Moments::new("sesame.completion.duration_seconds");
pub(crate) static COMPLETION_INLINE_PAYLOADS: Counter =
    Counter::new("sesame.completion.inline_payloads");

pub(crate) static CHAT_SENDS: Counter = Counter::new("sesame.chat.sends");
pub(crate) static CHAT_SEND_FAILURES: Counter = Counter::new("sesame.chat.send_failures");

pub(crate) static STORE_SAVES: Counter = Counter::new("sesame.store.saves");
pub(crate) static STORE_SAVE_ERRORS: Counter = Counter::new("sesame.store.save_errors");
pub(crate) static STORE_LOAD_FALLBACKS: Counter = Counter::new("sesame.store.load_fallbacks");

pub(crate) static ATTACHMENT_READS: Counter = Counter::new("sesame.composer.attachment_reads");
pub(crate) static ATTACHMENT_READ_ERRORS: Counter =
    Counter::new("sesame.composer.attachment_read_errors");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&COMPLETION_REQUESTS);
    collector.register_counter(&COMPLETION_ERRORS);
    collector.register_moments(&COMPLETION_DURATION);
    collector.register_counter(&COMPLETION_INLINE_PAYLOADS);

    collector.register_counter(&CHAT_SENDS);
    collector.register_counter(&CHAT_SEND_FAILURES);

    collector.register_counter(&STORE_SAVES);
    collector.register_counter(&STORE_SAVE_ERRORS);
    collector.register_counter(&STORE_LOAD_FALLBACKS);

    collector.register_counter(&ATTACHMENT_READS);
    collector.register_counter(&ATTACHMENT_READ_ERRORS);
}
