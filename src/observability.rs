use biometrics::{Collector, Counter, Moments};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("termchat.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter = Counter::new("termchat.client.request_errors");
pub(crate) static CLIENT_REQUEST_DURATION: Moments =
    Moments::new("termchat.client.request_duration_seconds");
pub(crate) static COMPLETION_REQUESTS: Counter = Counter::new("termchat.client.completions");
pub(crate) static IMAGE_REQUESTS: Counter = Counter::new("termchat.client.images");

pub(crate) static SESSION_TURNS: Counter = Counter::new("termchat.session.turns");
pub(crate) static SESSION_REGENERATIONS: Counter = Counter::new("termchat.session.regenerations");
pub(crate) static SESSION_COMMANDS: Counter = Counter::new("termchat.session.commands");
pub(crate) static SESSION_ERRORS: Counter = Counter::new("termchat.session.errors");
pub(crate) static SESSION_IMAGES_CANCELED: Counter =
    Counter::new("termchat.session.images_canceled");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_moments(&CLIENT_REQUEST_DURATION);
    collector.register_counter(&COMPLETION_REQUESTS);
    collector.register_counter(&IMAGE_REQUESTS);

    collector.register_counter(&SESSION_TURNS);
    collector.register_counter(&SESSION_REGENERATIONS);
    collector.register_counter(&SESSION_COMMANDS);
    collector.register_counter(&SESSION_ERRORS);
    collector.register_counter(&SESSION_IMAGES_CANCELED);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_with_collector() {
        register_biometrics(Collector::new());
    }

    #[test]
    fn counters_accumulate() {
        let before = SESSION_COMMANDS.read();
        SESSION_COMMANDS.click();
        assert!(SESSION_COMMANDS.read() > before);
    }
}
