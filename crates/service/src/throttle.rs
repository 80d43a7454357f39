//! Per-principal request throttling.
//!
//! Fixed one-minute windows keyed by user id, with the allowance picked by
//! role: staff and admin share the elevated quota, plain users get the
//! lower one. Anonymous requests are not throttled here; unauthenticated
//! traffic only reaches public endpoints and everything else denies it
//! before any quota applies.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::warn;
use uuid::Uuid;

use crate::access::{Principal, Role};

/// Requests allowed per principal per window.
#[derive(Debug, Clone, Copy)]
pub struct RateLimits {
    pub staff_per_window: u32,
    pub user_per_window: u32,
}

impl Default for RateLimits {
    fn default() -> Self {
        Self { staff_per_window: 500, user_per_window: 200 }
    }
}

struct Window {
    started: Instant,
    count: u32,
}

/// Shared request throttle. One counting window per principal; windows
/// reset wholesale once their duration elapses.
pub struct Throttle {
    limits: RateLimits,
    window: Duration,
    windows: Mutex<HashMap<Uuid, Window>>,
}

impl Throttle {
    pub fn new(limits: RateLimits) -> Self {
        Self::with_window(limits, Duration::from_secs(60))
    }

    pub fn with_window(limits: RateLimits, window: Duration) -> Self {
        Self { limits, window, windows: Mutex::new(HashMap::new()) }
    }

    fn limit_for(&self, role: Role) -> u32 {
        match role {
            Role::Admin | Role::Staff => self.limits.staff_per_window,
            Role::User => self.limits.user_per_window,
        }
    }

    /// Count one request against the principal's window. `false` when the
    /// allowance for the current window is spent.
    pub async fn allow(&self, principal: &Principal) -> bool {
        let limit = self.limit_for(principal.role);
        let now = Instant::now();

        let mut windows = self.windows.lock().await;
        let window = windows
            .entry(principal.id)
            .or_insert(Window { started: now, count: 0 });
        if now.duration_since(window.started) >= self.window {
            window.started = now;
            window.count = 0;
        }
        if window.count >= limit {
            warn!(user_id = %principal.id, role = %principal.role, limit, "request throttled");
            return false;
        }
        window.count += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(role: Role) -> Principal {
        Principal { id: Uuid::new_v4(), role }
    }

    fn throttle(staff: u32, user: u32) -> Throttle {
        Throttle::new(RateLimits { staff_per_window: staff, user_per_window: user })
    }

    #[tokio::test]
    async fn allows_up_to_the_role_limit_then_denies() {
        let t = throttle(5, 2);
        let p = principal(Role::User);
        assert!(t.allow(&p).await);
        assert!(t.allow(&p).await);
        assert!(!t.allow(&p).await);
    }

    #[tokio::test]
    async fn staff_and_admin_share_the_elevated_limit() {
        let t = throttle(3, 1);
        for p in [principal(Role::Staff), principal(Role::Admin)] {
            assert!(t.allow(&p).await);
            assert!(t.allow(&p).await);
            assert!(t.allow(&p).await);
            assert!(!t.allow(&p).await);
        }
    }

    #[tokio::test]
    async fn windows_are_per_principal() {
        let t = throttle(5, 1);
        let a = principal(Role::User);
        let b = principal(Role::User);
        assert!(t.allow(&a).await);
        assert!(!t.allow(&a).await);
        // a's spent window must not affect b
        assert!(t.allow(&b).await);
    }

    #[tokio::test]
    async fn window_resets_after_it_elapses() {
        let t = Throttle::with_window(
            RateLimits { staff_per_window: 5, user_per_window: 1 },
            Duration::from_millis(50),
        );
        let p = principal(Role::User);
        assert!(t.allow(&p).await);
        assert!(!t.allow(&p).await);
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(t.allow(&p).await);
    }
}
