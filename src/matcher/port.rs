use super::RangeMatcher;
use crate::types::PortRange;

impl RangeMatcher<u16> for PortRange {
    fn matches(&self, port: u16) -> bool {
        port >= self.start && port <= self.end
    }
}
