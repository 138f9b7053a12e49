// model = "claude-opus-4-5"
// created = "2026-10-15"
// modified = "2026-10-17"
// driver = "Isaac Clayton"

//! AFL fuzz harness for document convergence.
//!
//! Each user edits a private replica. Operations queue up in a per-user
//! outbox and are delivered to other replicas in fuzzer-chosen order,
//! sometimes twice. After a final flush every replica must show the same
//! text and the same digest.

use afl::fuzz;
use scribe::config::Config;
use scribe::crdt::Crdt;
use scribe::crdt::document::Document;
use scribe::crdt::editor::Editor;
use scribe::crdt::op::Operation;

const NUM_USERS: usize = 3;

#[derive(Debug, Clone, Copy)]
enum FuzzOp {
    /// User inserts text at a fraction of their document length
    Insert { user: u8, pos_frac: u8, len: u8 },
    /// User deletes characters at a fraction of their document length
    Delete { user: u8, pos_frac: u8, len: u8 },
    /// Deliver one queued operation from one outbox to one replica
    Deliver { from: u8, to: u8, pick: u8 },
    /// Deliver one queued operation without removing it from the outbox
    Redeliver { from: u8, to: u8, pick: u8 },
    /// Collect garbage on one replica
    Collect { user: u8 },
    /// Merge every replica into every other
    FullSync,
}

impl FuzzOp {
    fn from_bytes(bytes: &[u8]) -> Option<(FuzzOp, &[u8])> {
        if bytes.is_empty() {
            return None;
        }

        let op_type = bytes[0] % 6;
        let rest = &bytes[1..];
        let user = |b: u8| b % NUM_USERS as u8;

        match op_type {
            0 if rest.len() >= 3 => {
                let op = FuzzOp::Insert { user: user(rest[0]), pos_frac: rest[1], len: (rest[2] % 16).saturating_add(1) };
                return Some((op, &rest[3..]));
            }
            1 if rest.len() >= 3 => {
                let op = FuzzOp::Delete { user: user(rest[0]), pos_frac: rest[1], len: (rest[2] % 8).saturating_add(1) };
                return Some((op, &rest[3..]));
            }
            2 if rest.len() >= 3 => {
                let op = FuzzOp::Deliver { from: user(rest[0]), to: user(rest[1]), pick: rest[2] };
                return Some((op, &rest[3..]));
            }
            3 if rest.len() >= 3 => {
                let op = FuzzOp::Redeliver { from: user(rest[0]), to: user(rest[1]), pick: rest[2] };
                return Some((op, &rest[3..]));
            }
            4 if !rest.is_empty() => return Some((FuzzOp::Collect { user: user(rest[0]) }, &rest[1..])),
            5 => return Some((FuzzOp::FullSync, rest)),
            _ => return None,
        }
    }
}

fn assert_converged(replicas: &[Document]) {
    let first = replicas[0].visible_text();
    let digest = replicas[0].digest();
    for (i, r) in replicas.iter().enumerate().skip(1) {
        assert_eq!(r.visible_text(), first, "Convergence failure! User {} != User 0", i);
        assert_eq!(r.digest(), digest, "Digest mismatch! User {} != User 0", i);
    }
}

fn full_sync(replicas: &mut [Document]) {
    for i in 0..replicas.len() {
        for j in 0..replicas.len() {
            if i != j {
                let source = replicas[j].clone();
                replicas[i].merge(&source);
            }
        }
    }
}

fn main() {
    // Small base and boundary so paths grow deep quickly.
    let config = Config { base: 8, boundary: 2, gc_threshold: Some(4) };

    fuzz!(|data: &[u8]| {
        let mut replicas: Vec<Document> = (0..NUM_USERS).map(|i| Document::with_config(format!("replica-{}", i), &config)).collect();
        let mut editors: Vec<Editor> = (0..NUM_USERS).map(|i| Editor::new(format!("user-{}", i), &config)).collect();
        let mut outboxes: Vec<Vec<Operation>> = vec![Vec::new(); NUM_USERS];
        let mut remaining = data;

        while let Some((op, rest)) = FuzzOp::from_bytes(remaining) {
            remaining = rest;

            match op {
                FuzzOp::Insert { user, pos_frac, len } => {
                    let u = user as usize;
                    let doc_len = replicas[u].len();
                    let pos = (pos_frac as usize * doc_len / 256).min(doc_len);
                    let content: String = (0..len).map(|i| (b'A' + user.wrapping_add(i) % 26) as char).collect();
                    let ops = editors[u].insert_str(&mut replicas[u], pos, &content).unwrap();
                    outboxes[u].extend(ops);
                }

                FuzzOp::Delete { user, pos_frac, len } => {
                    let u = user as usize;
                    let doc_len = replicas[u].len();
                    if doc_len > 0 {
                        let pos = (pos_frac as usize * doc_len / 256).min(doc_len - 1);
                        let count = (len as usize).min(doc_len - pos);
                        for _ in 0..count {
                            let op = editors[u].delete(&mut replicas[u], pos).unwrap();
                            outboxes[u].push(op);
                        }
                    }
                }

                FuzzOp::Deliver { from, to, pick } => {
                    let outbox = &mut outboxes[from as usize];
                    if from != to && !outbox.is_empty() {
                        let op = outbox.remove(pick as usize % outbox.len());
                        replicas[to as usize].apply(op).unwrap();
                    }
                }

                FuzzOp::Redeliver { from, to, pick } => {
                    let outbox = &outboxes[from as usize];
                    if from != to && !outbox.is_empty() {
                        let op = outbox[pick as usize % outbox.len()].clone();
                        replicas[to as usize].apply(op).unwrap();
                    }
                }

                FuzzOp::Collect { user } => {
                    replicas[user as usize].collect_garbage();
                }

                FuzzOp::FullSync => {
                    full_sync(&mut replicas);
                    assert_converged(&replicas);
                }
            }
        }

        full_sync(&mut replicas);
        assert_converged(&replicas);
    });
}
