use crate::config::gateway::MAX_PACKET_HISTORY;
use super::domain::HistoryEntry;


/// Buffer circular con los últimos paquetes aceptados.
///
/// Una vez lleno, cada inserción sobrescribe la entrada más antigua.
#[derive(Debug, Clone)]
pub struct PacketHistory {
    slots: Vec<Option<HistoryEntry>>,
    cursor: usize,
    len: usize,
}


impl Default for PacketHistory {
    fn default() -> Self {
        Self::new(MAX_PACKET_HISTORY)
    }
}


impl PacketHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity.max(1)],
            cursor: 0,
            len: 0,
        }
    }

    pub fn append(&mut self, entry: HistoryEntry) {
        let capacity = self.slots.len();
        self.slots[self.cursor] = Some(entry);
        self.cursor = (self.cursor + 1) % capacity;
        if self.len < capacity {
            self.len += 1;
        }
    }

    /// Recorre el buffer del más reciente al más antiguo, partiendo del cursor actual.
    pub fn recent(&self) -> Recent<'_> {
        Recent {
            history: self,
            step: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}


pub struct Recent<'a> {
    history: &'a PacketHistory,
    step: usize,
}


impl<'a> Iterator for Recent<'a> {
    type Item = &'a HistoryEntry;

    fn next(&mut self) -> Option<Self::Item> {
        if self.step >= self.history.len {
            return None;
        }
        let capacity = self.history.slots.len();
        let index = (self.history.cursor + capacity - 1 - self.step) % capacity;
        self.step += 1;
        self.history.slots[index].as_ref()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.history.len - self.step.min(self.history.len);
        (remaining, Some(remaining))
    }
}


impl ExactSizeIterator for Recent<'_> {}


#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn entry(n: u64) -> HistoryEntry {
        HistoryEntry::new(&format!("N{n}"), None, -80, 5.0, Duration::from_secs(n))
    }

    fn ids(history: &PacketHistory) -> Vec<String> {
        history.recent().map(|e| e.node_id.clone()).collect()
    }

    #[test]
    fn empty_history_yields_nothing() {
        let history = PacketHistory::default();
        assert!(history.is_empty());
        assert_eq!(history.recent().count(), 0);
    }

    #[test]
    fn newest_first_before_wrapping() {
        let mut history = PacketHistory::new(5);
        for n in 1..=3 {
            history.append(entry(n));
        }
        assert_eq!(ids(&history), ["N3", "N2", "N1"]);
    }

    #[test]
    fn keeps_only_the_last_capacity_entries() {
        let mut history = PacketHistory::default();
        for n in 1..=47 {
            history.append(entry(n));
        }

        assert_eq!(history.len(), MAX_PACKET_HISTORY);
        let expected: Vec<String> = (18..=47).rev().map(|n| format!("N{n}")).collect();
        assert_eq!(ids(&history), expected);
        assert_eq!(history.recent().len(), MAX_PACKET_HISTORY);
    }

    #[test]
    fn recent_is_restartable() {
        let mut history = PacketHistory::new(2);
        history.append(entry(1));
        history.append(entry(2));

        let first = ids(&history);
        let second = ids(&history);
        assert_eq!(first, second);

        history.append(entry(3));
        assert_eq!(ids(&history), ["N3", "N2"]);
    }

    #[test]
    fn non_object_data_becomes_empty_map() {
        let e = HistoryEntry::new("N1", Some(&serde_json::json!([1, 2])), -80, 1.0, Duration::ZERO);
        assert_eq!(e.data, serde_json::json!({}));

        let e = HistoryEntry::new("N1", Some(&serde_json::json!({"t": 1})), -80, 1.0, Duration::ZERO);
        assert_eq!(e.data, serde_json::json!({"t": 1}));
    }
}
