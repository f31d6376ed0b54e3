use super::*;
use crate::clock::ManualClock;

const INTERVAL: Duration = Duration::from_millis(2000);

fn limiter() -> (RateLimiter, ManualClock) {
    let clock = ManualClock::new();
    (RateLimiter::new(INTERVAL, Rc::new(clock.clone())), clock)
}

#[test]
fn first_call_is_always_allowed() {
    let (rl, _) = limiter();
    for category in Category::ALL {
        assert!(rl.allow(category));
    }
}

#[test]
fn calls_inside_interval_are_denied() {
    let (rl, clock) = limiter();
    rl.mark_called(Category::Resources);
    clock.advance_ms(1999);
    assert!(!rl.allow(Category::Resources));
}

#[test]
fn call_exactly_at_interval_is_allowed() {
    let (rl, clock) = limiter();
    rl.mark_called(Category::SocialMedia);
    clock.advance_ms(2000);
    assert!(rl.allow(Category::SocialMedia));
}

#[test]
fn categories_do_not_interfere() {
    let (rl, _) = limiter();
    rl.mark_called(Category::Disasters);
    assert!(!rl.allow(Category::Disasters));
    assert!(rl.allow(Category::SocialMedia));
    assert!(rl.allow(Category::Resources));
    assert!(rl.allow(Category::Updates));
}

#[test]
fn allow_without_mark_does_not_consume() {
    let (rl, _) = limiter();
    assert!(rl.allow(Category::Resources));
    assert!(rl.allow(Category::Resources));
    assert!(rl.gate(Category::Resources).last_call().is_none());
}

#[test]
fn try_acquire_marks_on_success_only() {
    let (rl, clock) = limiter();
    assert!(rl.try_acquire(Category::Updates));
    let first = rl.gate(Category::Updates).last_call();
    clock.advance_ms(500);
    assert!(!rl.try_acquire(Category::Updates));
    assert_eq!(rl.gate(Category::Updates).last_call(), first);
}

#[test]
fn gate_reopens_after_interval_from_last_mark() {
    let (rl, clock) = limiter();
    rl.mark_called(Category::Disasters);
    clock.advance_ms(2500);
    assert!(rl.try_acquire(Category::Disasters));
    clock.advance_ms(1000);
    assert!(!rl.allow(Category::Disasters));
}

#[test]
fn only_disaster_list_skips_selection_guard() {
    assert!(!Category::Disasters.requires_selection());
    assert!(Category::SocialMedia.requires_selection());
    assert!(Category::Resources.requires_selection());
    assert!(Category::Updates.requires_selection());
}

#[test]
fn released_slot_admits_the_next_call() {
    let (rl, clock) = limiter();
    let marked = rl.acquire(Category::Resources).unwrap();
    clock.advance_ms(500);
    assert!(rl.acquire(Category::Resources).is_none());
    rl.release(Category::Resources, marked);
    assert!(rl.try_acquire(Category::Resources));
}

#[test]
fn release_leaves_a_newer_mark_alone() {
    let (rl, clock) = limiter();
    let stale = rl.acquire(Category::Updates).unwrap();
    clock.advance_ms(2000);
    assert!(rl.try_acquire(Category::Updates));
    rl.release(Category::Updates, stale);
    assert!(!rl.allow(Category::Updates));
}
