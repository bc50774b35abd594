//! Forwarding of log records into console output.
//!
//! Install with [`LogPlugin::custom_layer`](bevy::log::LogPlugin::custom_layer):
//!
//! ```ignore
//! App::new().add_plugins(DefaultPlugins.set(LogPlugin {
//!     custom_layer: bevy_runtime_vars::logging::console_log_layer,
//!     ..default()
//! }));
//! ```

use std::sync::mpsc;

use bevy::log::{BoxedLayer, Level};
use bevy::prelude::*;
use tracing::Subscriber;
use tracing_subscriber::field::Visit;
use tracing_subscriber::Layer;

use crate::core::{ConsoleOutputEvent, ConsoleOutputLevel};

/// Layer factory for [`LogPlugin::custom_layer`](bevy::log::LogPlugin::custom_layer).
pub fn console_log_layer(app: &mut App) -> Option<BoxedLayer> {
    Some(Box::new(create_capture_layer(app)))
}

fn create_capture_layer(app: &mut App) -> LogCaptureLayer {
    let (sender, receiver) = mpsc::channel();
    app.add_message::<ConsoleOutputEvent>();
    app.insert_non_send_resource(CapturedLogs(receiver));
    app.add_systems(PostUpdate, transfer_logs);

    LogCaptureLayer { sender }
}

/// Console severity for a log level. Debug and trace records are not forwarded.
pub fn output_level(level: Level) -> Option<ConsoleOutputLevel> {
    match level {
        Level::ERROR => Some(ConsoleOutputLevel::Error),
        Level::WARN => Some(ConsoleOutputLevel::Warn),
        Level::INFO => Some(ConsoleOutputLevel::Info),
        _ => None,
    }
}

fn transfer_logs(receiver: NonSend<CapturedLogs>, mut output: MessageWriter<ConsoleOutputEvent>) {
    for event in receiver.0.try_iter() {
        output.write(event);
    }
}

/// Records waiting for [`transfer_logs`].
struct CapturedLogs(mpsc::Receiver<ConsoleOutputEvent>);

struct LogCaptureLayer {
    sender: mpsc::Sender<ConsoleOutputEvent>,
}

impl<S: Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>> Layer<S>
    for LogCaptureLayer
{
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let Some(level) = output_level(*event.metadata().level()) else {
            return;
        };
        let mut message = None;
        event.record(&mut MessageVisitor(&mut message));
        if let Some(message) = message {
            let _ = self.sender.send(ConsoleOutputEvent::new(level, message));
        }
    }
}

struct MessageVisitor<'a>(&'a mut Option<String>);

impl Visit for MessageVisitor<'_> {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            *self.0 = Some(format!("{value:?}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::layer::SubscriberExt;

    #[test]
    fn test_output_level() {
        assert_eq!(output_level(Level::ERROR), Some(ConsoleOutputLevel::Error));
        assert_eq!(output_level(Level::WARN), Some(ConsoleOutputLevel::Warn));
        assert_eq!(output_level(Level::INFO), Some(ConsoleOutputLevel::Info));
        assert_eq!(output_level(Level::DEBUG), None);
    }

    #[test]
    fn test_layer_forwards_messages() {
        let (sender, receiver) = mpsc::channel();
        let subscriber = tracing_subscriber::registry().with(LogCaptureLayer { sender });

        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!("value rejected");
            tracing::debug!("not forwarded");
        });

        let events: Vec<_> = receiver.try_iter().collect();
        assert_eq!(events, vec![ConsoleOutputEvent::warn("value rejected")]);
    }
}
