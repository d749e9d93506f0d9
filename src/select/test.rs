use super::*;
use crate::{channel::ChannelBuilder, test_util::Log};

type Entry = (&'static str, &'static str);

fn tagged(log: &Log<Entry>) -> impl FnOnce(&Channel<&'static str>, &&'static str) {
    let log = log.clone();
    move |channel: &Channel<&'static str>, payload: &&'static str| {
        log.push((channel.name(), *payload))
    }
}

fn named(name: &'static str) -> Channel<&'static str> {
    ChannelBuilder::new().name(name).build()
}

#[test]
fn select_fires_once() {
    let log = Log::new();
    let (c1, c2) = (named("c1"), named("c2"));
    let handle = select(tagged(&log), [&c1, &c2]);
    assert!(!handle.is_done());
    assert_eq!(c1.reader_count(), 1);
    assert_eq!(c2.reader_count(), 1);

    c1.write("x");
    c2.write("y");
    c1.write("z");
    assert_eq!(log.entries(), [("c1", "x")]);
    assert!(handle.is_done());
    assert_eq!(c1.reader_count(), 0);
    assert_eq!(c2.reader_count(), 0);
    assert_eq!(c2.pending_len(), 1);
}

#[test]
fn first_registered_ready_channel_wins() {
    let log = Log::new();
    let (c1, c2, c3) = (named("c1"), named("c2"), named("c3"));
    c3.write("late");
    c2.write("early");

    select(tagged(&log), [&c1, &c2, &c3]);
    assert_eq!(log.entries(), [("c2", "early")]);
    assert_eq!(c1.reader_count(), 0);
    assert_eq!(c2.reader_count(), 0);
    assert_eq!(c3.reader_count(), 0);
    assert_eq!(c3.pending_len(), 1);
}

#[test]
fn select_unregisters_before_callback_runs() {
    let log = Log::new();
    let (c1, c2) = (named("c1"), named("c2"));
    select(
        {
            let log = log.clone();
            let c2 = c2.clone();
            move |channel: &Channel<&'static str>, payload: &&'static str| {
                log.push((channel.name(), *payload));
                assert_eq!(channel.reader_count(), 0);
                assert_eq!(c2.reader_count(), 0);
                c2.write("from callback");
            }
        },
        [&c1, &c2],
    );

    c1.write("x");
    assert_eq!(log.entries(), [("c1", "x")]);
    assert_eq!(c2.pending_len(), 1);
}

#[test]
fn select_leaves_other_readers_alone() {
    let log = Log::new();
    let (c1, c2) = (named("c1"), named("c2"));
    let other = Reader::new({
        let log = log.clone();
        move |_: &Channel<&'static str>, payload: &&'static str| log.push(("other", *payload))
    });
    c1.read(&other);
    select(tagged(&log), [&c1, &c2]);

    c1.write("x").write("y");
    assert_eq!(
        log.entries(),
        [("other", "x"), ("c1", "x"), ("other", "y")]
    );
    assert_eq!(c1.reader_count(), 1);
}

#[test]
fn cancelled_select_never_fires() {
    let log = Log::new();
    let (c1, c2) = (named("c1"), named("c2"));
    let handle = select(tagged(&log), [&c1, &c2]);
    assert!(handle.cancel());
    assert!(!handle.cancel());
    assert!(handle.is_done());

    c1.write("x");
    c2.write("y");
    assert!(log.entries().is_empty());
    assert_eq!(c1.reader_count(), 0);
    assert_eq!(c2.reader_count(), 0);
}

#[test]
fn fired_select_cannot_be_cancelled() {
    let log = Log::new();
    let c1 = named("c1");
    let handle = select(tagged(&log), [&c1]);
    c1.write("x");
    assert!(!handle.cancel());
}

#[test]
fn select_on_same_channel_twice_fires_once() {
    let log = Log::new();
    let c1 = named("c1");
    select(tagged(&log), [&c1, &c1]);
    assert_eq!(c1.reader_count(), 2);

    c1.write("x");
    assert_eq!(log.entries(), [("c1", "x")]);
    assert_eq!(c1.reader_count(), 0);
}

#[test]
fn select_survives_dropped_channel() {
    let log = Log::new();
    let (c1, c2) = (named("c1"), named("c2"));
    select(tagged(&log), [&c1, &c2]);
    drop(c1);
    c2.write("y");
    assert_eq!(log.entries(), [("c2", "y")]);
}
