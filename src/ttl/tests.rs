// =====================================================================
// File: ttl/tests.rs
//
// Description:
//   Unit tests for the TTL deadline table and the background expirer.
//
// Notes:
//   * Only compiled when running `cargo test`.
// =====================================================================

// =====================================================================
// TtlManager Unit Tests
// =====================================================================
mod manager_tests {
    use std::thread::sleep;
    use std::time::Duration;

    use crate::ttl::TtlManager;

    #[test]
    fn set_deadline_records_entry() {
        let mut ttl = TtlManager::new();
        ttl.set_deadline("dog", Duration::from_millis(200));
        assert!(ttl.has_entry("dog"));
        assert_eq!(ttl.active_count(), 1);
        assert!(!ttl.is_expired("dog"));
    }

    #[test]
    fn zero_duration_expires_immediately() {
        let mut ttl = TtlManager::new();
        ttl.set_deadline("cat", Duration::ZERO);
        assert!(ttl.is_expired("cat"));
    }

    #[test]
    fn key_expires_after_delay() {
        let mut ttl = TtlManager::new();
        ttl.set_deadline("bird", Duration::from_millis(50));
        sleep(Duration::from_millis(80));
        assert!(ttl.is_expired("bird"));
    }

    #[test]
    fn untracked_key_never_expires() {
        let ttl = TtlManager::new();
        assert!(!ttl.is_expired("ghost"));
    }

    #[test]
    fn clear_deadline_makes_key_persistent() {
        let mut ttl = TtlManager::new();
        ttl.set_deadline("frog", Duration::from_millis(50));
        assert!(ttl.clear_deadline("frog"));
        sleep(Duration::from_millis(80));
        assert!(!ttl.is_expired("frog"));
    }

    #[test]
    fn clear_deadline_on_untracked_key_returns_false() {
        let mut ttl = TtlManager::new();
        assert!(!ttl.clear_deadline("nope"));
    }

    #[test]
    fn replacing_deadline_extends_lifetime() {
        let mut ttl = TtlManager::new();
        ttl.set_deadline("fish", Duration::from_millis(30));
        ttl.set_deadline("fish", Duration::from_secs(60));
        sleep(Duration::from_millis(50));
        assert!(!ttl.is_expired("fish"));
        assert_eq!(ttl.active_count(), 1);
    }

    #[test]
    fn expired_keys_reports_only_stale_entries() {
        let mut ttl = TtlManager::new();
        ttl.set_deadline("old", Duration::from_millis(40));
        ttl.set_deadline("new", Duration::from_secs(60));
        sleep(Duration::from_millis(60));
        assert_eq!(ttl.expired_keys(), vec!["old".to_string()]);
    }

    #[test]
    fn table_handles_many_entries() {
        let mut ttl = TtlManager::new();
        for i in 0..1000 {
            ttl.set_deadline(&format!("k{i}"), Duration::from_secs(30));
        }
        assert_eq!(ttl.active_count(), 1000);
    }
}

// =====================================================================
// Expirer Thread Unit Tests
// =====================================================================
mod expirer_tests {
    use std::sync::Arc;
    use std::thread::sleep;
    use std::time::Duration;

    use parking_lot::Mutex;

    use crate::store::Keyspace;
    use crate::ttl::spawn_expirer;

    #[test]
    fn expirer_reclaims_stale_keys() {
        let keyspace = Arc::new(Mutex::new(Keyspace::new()));
        {
            let mut ks = keyspace.lock();
            ks.set("temp".into(), "123".into(), Some(Duration::from_millis(40)));
            ks.set("perm".into(), "456".into(), None);
        }

        spawn_expirer(Arc::clone(&keyspace), Duration::from_millis(20));
        sleep(Duration::from_millis(150));

        let ks = keyspace.lock();
        assert!(!ks.contains("temp"), "stale key should be swept");
        assert!(ks.contains("perm"));
        assert_eq!(ks.ttl_active_count(), 0);
    }

    #[test]
    fn expirer_leaves_live_keys_alone() {
        let keyspace = Arc::new(Mutex::new(Keyspace::new()));
        keyspace
            .lock()
            .set("dog".into(), "bark".into(), Some(Duration::from_secs(60)));

        spawn_expirer(Arc::clone(&keyspace), Duration::from_millis(20));
        sleep(Duration::from_millis(100));

        let ks = keyspace.lock();
        assert!(ks.contains("dog"));
        assert_eq!(ks.ttl_active_count(), 1);
    }
}
