//! Custom stream alerts
//!
//! Named canned messages the streamer can define with `addalert` and recall
//! with `alert`. Held in process memory; repeated names overwrite.

use std::collections::HashMap;

/// A named alert message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub name: String,
    pub message: String,
}

/// In-memory alert store keyed by name
#[derive(Debug, Default)]
pub struct AlertStore {
    alerts: HashMap<String, Alert>,
}

impl AlertStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-loaded with the default flight-sim alert pack
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut store = Self::new();
        store.load_defaults();
        store
    }

    /// Add or overwrite an alert
    pub fn set(&mut self, name: &str, message: &str) {
        tracing::info!(name, "adding alert");
        self.alerts.insert(
            name.to_string(),
            Alert {
                name: name.to_string(),
                message: message.to_string(),
            },
        );
    }

    /// Look up an alert by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Alert> {
        self.alerts.get(name)
    }

    /// Remove an alert by name
    pub fn remove(&mut self, name: &str) {
        if self.alerts.remove(name).is_some() {
            tracing::info!(name, "removed alert");
        }
    }

    /// Number of stored alerts
    #[must_use]
    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    /// Whether the store is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }

    /// Pre-load the flight-simulation alert pack
    pub fn load_defaults(&mut self) {
        // Flight milestones
        self.set("takeoff_alert", "Takeoff successful! Time to soar through the skies. Fasten your seatbelts, folks!");
        self.set("landing_alert", "Smooth landing! All passengers may now disembark. Well done, Captain!");
        self.set("altitude_alert", "You've reached cruising altitude. Time to sit back, relax, and enjoy the views.");

        // Emergencies
        self.set("engine_failure", "Engine failure detected! Prepare for emergency landing procedures.");
        self.set("turbulence_warning", "Turbulence ahead! Keep a steady hand on the controls. Buckle up, viewers!");
        self.set("crash_alert", "Mayday, Mayday! We've lost control! The plane is going down! RIP flight.");

        // User-triggered fun
        self.set("passenger_complaint", "A passenger has complained about the in-flight service! Maybe a smoother ride next time?");
        self.set("beverage_service", "Flight attendants, please serve beverages to the passengers. What's your drink of choice?");
        self.set("bird_strike", "Bird strike! Watch out for the geese! Quick, recover control of the plane!");

        // Stream interaction
        self.set("new_crew_member", "Welcome aboard, [username]! You've officially joined the flight crew!");
        self.set("low_fuel", "Warning: Low fuel! Should we refuel or attempt a landing?");

        // Realism / procedure
        self.set("checklist_reminder", "Captain, have you completed your pre-flight checklist? It's important to ensure a safe flight.");
        self.set("nav_update", "New waypoint detected. Adjust heading to stay on course.");

        // Community engagement
        self.set("safety_briefing", "Please direct your attention to the safety briefing card in the seat pocket in front of you.");
        self.set("captains_log", "Captain's Log: [Current in-game date/time]. The flight is progressing smoothly, and the crew is in good spirits.");
        self.set("plane_upgrade", "The airline has upgraded/downgraded your plane. Time to adjust your flight plan!");

        // Airport / flight plan
        self.set("runway_clear", "Runway cleared for takeoff. All systems go, Captain!");
        self.set("diversion_alert", "Flight diverted due to weather or mechanical failure! Set course for the nearest airport.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_get() {
        let mut store = AlertStore::new();
        store.set("greet", "hello chat");
        assert_eq!(store.get("greet").unwrap().message, "hello chat");
    }

    #[test]
    fn repeated_get_returns_identical_message() {
        let mut store = AlertStore::new();
        store.set("greet", "hello chat");
        let first = store.get("greet").unwrap().message.clone();
        let second = store.get("greet").unwrap().message.clone();
        assert_eq!(first, second);
    }

    #[test]
    fn overwrite_on_repeated_name() {
        let mut store = AlertStore::new();
        store.set("greet", "hello");
        store.set("greet", "hi again");
        assert_eq!(store.get("greet").unwrap().message, "hi again");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn missing_alert_is_none() {
        let store = AlertStore::new();
        assert!(store.get("nope").is_none());
    }

    #[test]
    fn remove_deletes() {
        let mut store = AlertStore::new();
        store.set("greet", "hello");
        store.remove("greet");
        assert!(store.get("greet").is_none());
    }

    #[test]
    fn default_pack_loads() {
        let store = AlertStore::with_defaults();
        assert_eq!(store.len(), 19);
        assert!(
            store
                .get("takeoff_alert")
                .unwrap()
                .message
                .starts_with("Takeoff successful!")
        );
        assert!(store.get("bird_strike").is_some());
    }
}
