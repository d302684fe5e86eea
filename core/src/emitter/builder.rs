//! Builder pattern for EmitterLoop construction

use crate::config::EmitterOptions;
use crate::error::{EmitError, EmitResult};
use crate::traits::{Consumer, Emitted, Producer};

use super::executor::EmitterLoop;

/// Builder for creating EmitterLoop instances
///
/// # Example
/// ```
/// use datagen_core::{ConsumerError, EmitterBuilder, EmitterOptions, ProducerError};
///
/// let emitter = EmitterBuilder::new("datagen")
///     .options(EmitterOptions::default().with_iteration_limit(3).without_throttling())
///     .producer(|| Ok::<_, ProducerError>("value".to_string()))
///     .consumer(|item: String| -> Result<(), ConsumerError> {
///         assert_eq!(item, "value");
///         Ok(())
///     })
///     .build()?;
///
/// let handle = emitter.handle();
/// let summary = emitter.run()?;
/// assert_eq!(summary.count, 3);
/// assert!(handle.is_terminated());
/// # Ok::<(), datagen_core::EmitError>(())
/// ```
pub struct EmitterBuilder<T> {
    name: String,
    options: Option<EmitterOptions>,
    producer: Option<Box<dyn Producer<T>>>,
    consumer: Option<Box<dyn Consumer<T>>>,
}

impl<T: Emitted> EmitterBuilder<T> {
    /// Create a new builder for an emitter called `name`
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            options: None,
            producer: None,
            consumer: None,
        }
    }

    /// Set the options. Defaults to [`EmitterOptions::default`].
    pub fn options(mut self, options: EmitterOptions) -> Self {
        self.options = Some(options);
        self
    }

    /// Set the producer
    pub fn producer(mut self, producer: impl Producer<T> + 'static) -> Self {
        self.producer = Some(Box::new(producer));
        self
    }

    /// Set the consumer
    pub fn consumer(mut self, consumer: impl Consumer<T> + 'static) -> Self {
        self.consumer = Some(Box::new(consumer));
        self
    }

    /// Build the EmitterLoop
    ///
    /// # Errors
    /// Returns an error if the producer or consumer is missing.
    pub fn build(self) -> EmitResult<EmitterLoop<T>> {
        let producer = self
            .producer
            .ok_or(EmitError::missing_config("producer"))?;
        let consumer = self
            .consumer
            .ok_or(EmitError::missing_config("consumer"))?;
        let options = self.options.unwrap_or_default();

        Ok(EmitterLoop::from_boxed(self.name, options, producer, consumer))
    }
}
