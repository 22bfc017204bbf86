//! Macros for declaring machine descriptions.

/// Declare a machine description.
///
/// Expands to a [`MachineBuilder`](crate::builder::MachineBuilder) chain
/// and evaluates to `Result<MachineDescription, BuildError>`. Guards are
/// listed per state in the order they should be tried.
///
/// # Example
///
/// ```
/// use wirestate::machine;
///
/// let desc = machine! {
///     initial: "red",
///     final: "off",
///     transitions: {
///         "red" => { "timer" => "green", "stop" => "off" },
///         "green" => { "timer" => "yellow" },
///         "yellow" => { "timer" => "red" },
///     }
/// }
/// .unwrap();
///
/// assert_eq!(desc.initial.as_deref(), Some("red"));
/// assert_eq!(desc.transitions["green"]["timer"], "yellow");
/// ```
#[macro_export]
macro_rules! machine {
    (
        initial: $initial:expr,
        $(final: $final:expr,)?
        transitions: {
            $(
                $from:expr => { $($guard:expr => $to:expr),+ $(,)? }
            ),* $(,)?
        } $(,)?
    ) => {
        $crate::builder::MachineBuilder::new()
            .initial($initial)
            $(.final_state($final))?
            $(.state($from, [$(($guard, $to)),+]))*
            .build()
    };
}
