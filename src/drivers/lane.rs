//! Dual-lane presence detection
//!
//! Each lane watches one PIR output. Any level change on the input restarts
//! that lane's quiet-time count; once the lane has been quiet for long enough
//! the opposite occupancy is committed. Entering a lane needs
//! `min_full_ticks` quiet ticks, leaving it needs `min_empty_ticks`.
//!
//! The detector is plain data. On hardware it is shared with the pin-change
//! and timer-compare interrupts through a critical-section mutex; in tests
//! the events are injected directly.

use crate::config;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Lane {
    Lane1,
    Lane2,
}

impl Lane {
    pub const ALL: [Lane; 2] = [Lane::Lane1, Lane::Lane2];

    pub fn index(self) -> usize {
        match self {
            Lane::Lane1 => 0,
            Lane::Lane2 => 1,
        }
    }

    /// Bit of this lane's input on the PIR port
    pub fn pin_mask(self) -> u8 {
        match self {
            Lane::Lane1 => 1 << config::LANE_1_PIN,
            Lane::Lane2 => 1 << config::LANE_2_PIN,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Occupancy {
    Empty,
    Full,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LaneEvent {
    Occupied(Lane),
    Vacated(Lane),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Thresholds {
    /// Quiet ticks before a full lane becomes empty
    pub min_empty_ticks: u8,
    /// Quiet ticks before an empty lane becomes full
    pub min_full_ticks: u8,
}

impl Thresholds {
    pub const fn station() -> Self {
        Self {
            min_empty_ticks: config::MIN_LANE_EMPTY_TICKS,
            min_full_ticks: config::MIN_LANE_FULL_TICKS,
        }
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self::station()
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LaneState {
    pub occupancy: Occupancy,
    /// Counting quiet ticks since the last edge
    pub armed: bool,
    pub ticks: u8,
}

impl LaneState {
    pub const fn new() -> Self {
        Self {
            occupancy: Occupancy::Empty,
            armed: false,
            ticks: 0,
        }
    }
}

impl Default for LaneState {
    fn default() -> Self {
        Self::new()
    }
}

/// Lanes whose input changed in one pin-change event
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ChangedLanes(u8);

impl ChangedLanes {
    pub fn contains(self, lane: Lane) -> bool {
        self.0 & (1 << lane.index()) != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

#[derive(Debug)]
pub struct LaneDetector {
    lanes: [LaneState; 2],
    thresholds: Thresholds,
    history: u8,
}

impl LaneDetector {
    pub const fn new(thresholds: Thresholds) -> Self {
        Self {
            lanes: [LaneState::new(), LaneState::new()],
            thresholds,
            history: 0,
        }
    }

    /// Latch the current port levels so the first pin-change event only
    /// reports real edges
    pub fn prime(&mut self, port_levels: u8) {
        self.history = port_levels;
    }

    /// Pin-change event. Compares the port against the last seen levels and
    /// restarts the count of every lane that moved.
    pub fn on_pin_change(&mut self, port_levels: u8) -> ChangedLanes {
        let changed_bits = port_levels ^ self.history;
        self.history = port_levels;

        let mut changed = ChangedLanes::default();
        for lane in Lane::ALL {
            if changed_bits & lane.pin_mask() != 0 {
                self.on_edge(lane);
                changed.0 |= 1 << lane.index();
            }
        }
        changed
    }

    /// Level change on one lane's input
    pub fn on_edge(&mut self, lane: Lane) {
        let state = &mut self.lanes[lane.index()];
        state.ticks = 0;
        state.armed = true;
    }

    /// Timer compare event for one lane
    pub fn on_tick(&mut self, lane: Lane) -> Option<LaneEvent> {
        let thresholds = self.thresholds;
        let state = &mut self.lanes[lane.index()];
        if !state.armed {
            return None;
        }

        state.ticks = state.ticks.saturating_add(1);
        let (threshold, next, event) = match state.occupancy {
            Occupancy::Full => (
                thresholds.min_empty_ticks,
                Occupancy::Empty,
                LaneEvent::Vacated(lane),
            ),
            Occupancy::Empty => (
                thresholds.min_full_ticks,
                Occupancy::Full,
                LaneEvent::Occupied(lane),
            ),
        };

        if state.ticks >= threshold {
            state.occupancy = next;
            state.armed = false;
            Some(event)
        } else {
            None
        }
    }

    pub fn is_active(&self, lane: Lane) -> bool {
        self.lanes[lane.index()].occupancy == Occupancy::Full
    }

    pub fn state(&self, lane: Lane) -> LaneState {
        self.lanes[lane.index()]
    }

    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }
}

impl Default for LaneDetector {
    fn default() -> Self {
        Self::new(Thresholds::station())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticks(detector: &mut LaneDetector, lane: Lane, count: u16) -> Option<LaneEvent> {
        let mut last = None;
        for _ in 0..count {
            if let Some(event) = detector.on_tick(lane) {
                last = Some(event);
            }
        }
        last
    }

    #[test]
    fn starts_empty_and_disarmed() {
        let detector = LaneDetector::default();
        for lane in Lane::ALL {
            assert!(!detector.is_active(lane));
            assert_eq!(detector.state(lane), LaneState::new());
        }
    }

    #[test]
    fn ticks_without_edge_do_nothing() {
        let mut detector = LaneDetector::default();
        assert_eq!(ticks(&mut detector, Lane::Lane1, 1000), None);
        assert!(!detector.is_active(Lane::Lane1));
        assert_eq!(detector.state(Lane::Lane1).ticks, 0);
    }

    #[test]
    fn becomes_full_on_threshold_tick() {
        let mut detector = LaneDetector::default();
        detector.on_edge(Lane::Lane1);

        assert_eq!(ticks(&mut detector, Lane::Lane1, 99), None);
        assert!(!detector.is_active(Lane::Lane1));
        assert_eq!(
            detector.on_tick(Lane::Lane1),
            Some(LaneEvent::Occupied(Lane::Lane1))
        );
        assert!(detector.is_active(Lane::Lane1));
        assert!(!detector.state(Lane::Lane1).armed);
    }

    #[test]
    fn becomes_empty_after_longer_quiet_time() {
        let mut detector = LaneDetector::default();
        detector.on_edge(Lane::Lane2);
        ticks(&mut detector, Lane::Lane2, 100);
        assert!(detector.is_active(Lane::Lane2));

        detector.on_edge(Lane::Lane2);
        assert_eq!(ticks(&mut detector, Lane::Lane2, 154), None);
        assert!(detector.is_active(Lane::Lane2));
        assert_eq!(
            detector.on_tick(Lane::Lane2),
            Some(LaneEvent::Vacated(Lane::Lane2))
        );
        assert!(!detector.is_active(Lane::Lane2));
    }

    #[test]
    fn edge_restarts_the_count() {
        let mut detector = LaneDetector::default();
        detector.on_edge(Lane::Lane1);
        ticks(&mut detector, Lane::Lane1, 99);

        detector.on_edge(Lane::Lane1);
        assert_eq!(detector.state(Lane::Lane1).ticks, 0);
        assert_eq!(ticks(&mut detector, Lane::Lane1, 99), None);
        assert!(!detector.is_active(Lane::Lane1));
        assert!(detector.on_tick(Lane::Lane1).is_some());
    }

    #[test]
    fn lanes_are_independent() {
        let mut detector = LaneDetector::default();
        detector.on_edge(Lane::Lane1);
        ticks(&mut detector, Lane::Lane1, 200);

        assert!(detector.is_active(Lane::Lane1));
        assert_eq!(detector.state(Lane::Lane2), LaneState::new());

        // Lane 2 ticks never touch lane 1
        detector.on_edge(Lane::Lane1);
        ticks(&mut detector, Lane::Lane2, 500);
        assert_eq!(detector.state(Lane::Lane1).ticks, 0);
        assert!(detector.state(Lane::Lane1).armed);
    }

    #[test]
    fn full_cycle_on_lane_1_leaves_lane_2_untouched() {
        let mut detector = LaneDetector::default();
        detector.on_edge(Lane::Lane2);
        ticks(&mut detector, Lane::Lane2, 40);
        let lane_2 = detector.state(Lane::Lane2);

        detector.on_edge(Lane::Lane1);
        assert_eq!(
            ticks(&mut detector, Lane::Lane1, 100),
            Some(LaneEvent::Occupied(Lane::Lane1))
        );
        assert_eq!(detector.state(Lane::Lane2), lane_2);

        detector.on_edge(Lane::Lane1);
        assert_eq!(
            ticks(&mut detector, Lane::Lane1, 155),
            Some(LaneEvent::Vacated(Lane::Lane1))
        );
        assert!(!detector.is_active(Lane::Lane1));
        assert_eq!(detector.state(Lane::Lane2), lane_2);
        assert_eq!(lane_2.ticks, 40);
        assert!(lane_2.armed);
    }

    #[test]
    fn pin_change_reports_only_moved_lanes() {
        let mut detector = LaneDetector::default();
        let lane_1 = Lane::Lane1.pin_mask();
        let lane_2 = Lane::Lane2.pin_mask();
        detector.prime(0);

        let changed = detector.on_pin_change(lane_1 | 0x01);
        assert!(changed.contains(Lane::Lane1));
        assert!(!changed.contains(Lane::Lane2));
        assert!(detector.state(Lane::Lane1).armed);
        assert!(!detector.state(Lane::Lane2).armed);

        let changed = detector.on_pin_change(lane_1 | lane_2);
        assert!(!changed.contains(Lane::Lane1));
        assert!(changed.contains(Lane::Lane2));

        assert!(detector.on_pin_change(lane_1 | lane_2 | 0x02).is_empty());
    }

    #[test]
    fn primed_levels_are_not_edges() {
        let mut detector = LaneDetector::default();
        detector.prime(Lane::Lane1.pin_mask());

        assert!(detector.on_pin_change(Lane::Lane1.pin_mask()).is_empty());
        assert!(!detector.state(Lane::Lane1).armed);
    }

    #[test]
    fn custom_thresholds() {
        let mut detector = LaneDetector::new(Thresholds {
            min_empty_ticks: 2,
            min_full_ticks: 1,
        });
        detector.on_edge(Lane::Lane1);
        assert!(detector.on_tick(Lane::Lane1).is_some());
        detector.on_edge(Lane::Lane1);
        assert!(detector.on_tick(Lane::Lane1).is_none());
        assert!(detector.on_tick(Lane::Lane1).is_some());
        assert!(!detector.is_active(Lane::Lane1));
    }
}
