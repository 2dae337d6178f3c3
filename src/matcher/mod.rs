mod ip;
mod port;

/// Trait for range matchers
pub trait RangeMatcher<T> {
    /// Check if the value falls inside this range
    fn matches(&self, value: T) -> bool;
}
