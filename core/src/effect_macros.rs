//! Declarative macro for ergonomic effect construction.

/// Create an `Effect::Future` from an async block.
///
/// # Example
///
/// ```rust,ignore
/// use campushub_core::async_effect;
///
/// async_effect! {
///     notifier.event_status_email(&organizer, &title, false).await.ok();
///     None
/// }
/// ```
#[macro_export]
macro_rules! async_effect {
    ($($body:tt)*) => {
        $crate::effect::Effect::Future(
            ::std::boxed::Box::pin(async move { $($body)* })
        )
    };
}
