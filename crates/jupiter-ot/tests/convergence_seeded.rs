//! Seeded convergence property: arbitrary concurrent edits from three sites,
//! delivered in arbitrary (but causally valid, per-channel FIFO) order, leave
//! every replica byte-identical once all channels drain.

mod common;

use common::{Session, XorShift};

const PATH: &str = "/shared/doc.txt";
const LETTERS: [&str; 8] = ["a", "b", "c", "d", "x", "y", "z", "q"];

fn scripted_edit(session: &mut Session, client: usize, rng: &mut XorShift) {
    let len = session.clients[client].document.chars().count();
    if len > 0 && rng.next() % 3 == 0 {
        let position = (rng.next() % len as u64) as usize;
        let max_span = (len - position).min(2);
        let span = 1 + (rng.next() as usize % max_span);
        session.delete(client, position, span);
    } else {
        let position = (rng.next() % (len as u64 + 1)) as usize;
        let text = LETTERS[(rng.next() % LETTERS.len() as u64) as usize];
        session.insert(client, position, text);
    }
}

#[test]
fn interleaved_edits_converge_for_many_schedules() {
    for seed in 0..48u64 {
        let mut rng = XorShift::new(seed + 1);
        let mut session = Session::new(PATH, "abcdef", &["a", "b", "c"]);

        for _ in 0..40 {
            let client = (rng.next() % 3) as usize;
            match rng.next() % 5 {
                0 | 1 => scripted_edit(&mut session, client, &mut rng),
                2 | 3 => {
                    session.step_to_server(client);
                }
                _ => {
                    session.step_from_server(client);
                }
            }
        }
        session.run_to_quiescence(seed ^ 0xD1CE);

        session.assert_converged(None);
    }
}

#[test]
fn burst_edits_then_arbitrary_flush_order_converge() {
    for seed in 0..24u64 {
        let mut rng = XorShift::new((seed + 1) * 7);
        let mut session = Session::new(PATH, "the quick brown fox", &["a", "b", "c", "d"]);

        // Everyone edits blind, before any delivery at all.
        for client in 0..4 {
            for _ in 0..3 {
                scripted_edit(&mut session, client, &mut rng);
            }
        }
        session.run_to_quiescence(seed);

        session.assert_converged(None);
    }
}

#[test]
fn quiescent_session_is_stable_under_further_flushes() {
    let mut session = Session::new(PATH, "stable", &["a", "b"]);
    session.insert(0, 6, "!");
    session.run_to_quiescence(1);
    let before = session.replicas();
    session.run_to_quiescence(2);
    assert_eq!(session.replicas(), before);
}
