//! In-process worker group over channels.
//!
//! `LocalComm` implements `CommunicationBackend` for a fixed group of
//! workers running as OS threads in one process. Workers share nothing but
//! channels: every collective is built from point-to-point messages, so the
//! solver sees the same isolation it would under MPI.
//!
//! Each ordered pair of workers behaves as a FIFO link. Because all workers
//! issue the same collectives in the same order, the next message from a
//! given peer always belongs to the collective currently in progress.
//! Messages that arrive early from other peers are parked per source.

use std::collections::VecDeque;
use std::sync::mpsc::{channel, Receiver, Sender};

use parking_lot::Mutex;

use super::comm::{displacements, CommunicationBackend};
use super::pivot::PivotCandidate;

#[derive(Debug, Clone)]
enum Packet {
    Scalar(f64),
    Len(usize),
    Candidate(PivotCandidate),
    Values(Vec<f64>),
}

struct Inbox {
    receiver: Receiver<(usize, Packet)>,
    pending: Vec<VecDeque<Packet>>,
}

/// One member of an in-process worker group.
pub struct LocalComm {
    rank: usize,
    peers: Vec<Sender<(usize, Packet)>>,
    inbox: Mutex<Inbox>,
}

impl LocalComm {
    /// Create a fully connected group of `size` members, indexed by rank.
    pub fn group(size: usize) -> Vec<LocalComm> {
        assert!(size > 0, "worker group must have at least one member");
        let (senders, receivers): (Vec<_>, Vec<_>) = (0..size).map(|_| channel()).unzip();

        receivers
            .into_iter()
            .enumerate()
            .map(|(rank, receiver)| LocalComm {
                rank,
                peers: senders.clone(),
                inbox: Mutex::new(Inbox {
                    receiver,
                    pending: vec![VecDeque::new(); size],
                }),
            })
            .collect()
    }

    fn send(&self, to: usize, packet: Packet) {
        self.peers[to]
            .send((self.rank, packet))
            .unwrap_or_else(|_| panic!("worker {to} left the group mid-collective"));
    }

    fn recv_from(&self, from: usize) -> Packet {
        let mut inbox = self.inbox.lock();
        if let Some(packet) = inbox.pending[from].pop_front() {
            return packet;
        }
        loop {
            let (src, packet) = inbox
                .receiver
                .recv()
                .unwrap_or_else(|_| panic!("worker group dissolved while rank {} waited", self.rank));
            if src == from {
                return packet;
            }
            inbox.pending[src].push_back(packet);
        }
    }

    /// Send `packet` to every peer and collect one packet from each, in rank order.
    fn exchange(&self, packet: Packet) -> Vec<Packet> {
        for to in (0..self.num_ranks()).filter(|&r| r != self.rank) {
            self.send(to, packet.clone());
        }
        (0..self.num_ranks())
            .map(|from| {
                if from == self.rank {
                    packet.clone()
                } else {
                    self.recv_from(from)
                }
            })
            .collect()
    }
}

fn order_mismatch(expected: &str, got: &Packet) -> ! {
    panic!("collective order mismatch: expected {expected}, got {got:?}")
}

impl CommunicationBackend for LocalComm {
    fn rank(&self) -> usize {
        self.rank
    }

    fn num_ranks(&self) -> usize {
        self.peers.len()
    }

    fn all_reduce_max(&self, local: f64) -> f64 {
        self.exchange(Packet::Scalar(local))
            .iter()
            .map(|p| match p {
                Packet::Scalar(v) => *v,
                other => order_mismatch("scalar", other),
            })
            .fold(f64::NEG_INFINITY, f64::max)
    }

    fn all_reduce_max_loc(&self, local: PivotCandidate) -> PivotCandidate {
        self.exchange(Packet::Candidate(local))
            .iter()
            .map(|p| match p {
                Packet::Candidate(c) => *c,
                other => order_mismatch("pivot candidate", other),
            })
            .fold(PivotCandidate::NONE, PivotCandidate::combine)
    }

    fn broadcast(&self, root: usize, data: &mut [f64]) {
        if self.rank == root {
            for to in (0..self.num_ranks()).filter(|&r| r != root) {
                self.send(to, Packet::Values(data.to_vec()));
            }
        } else {
            match self.recv_from(root) {
                Packet::Values(v) => data.copy_from_slice(&v),
                other => order_mismatch("values", &other),
            }
        }
    }

    fn broadcast_len(&self, root: usize, value: usize) -> usize {
        if self.rank == root {
            for to in (0..self.num_ranks()).filter(|&r| r != root) {
                self.send(to, Packet::Len(value));
            }
            value
        } else {
            match self.recv_from(root) {
                Packet::Len(v) => v,
                other => order_mismatch("length", &other),
            }
        }
    }

    fn scatter_varcount(&self, root: usize, send: &[f64], counts: &[usize], recv: &mut [f64]) {
        if self.rank == root {
            let displs = displacements(counts);
            for (to, (&start, &count)) in displs.iter().zip(counts).enumerate() {
                let piece = &send[start..start + count];
                if to == root {
                    recv.copy_from_slice(piece);
                } else {
                    self.send(to, Packet::Values(piece.to_vec()));
                }
            }
        } else {
            match self.recv_from(root) {
                Packet::Values(v) => recv.copy_from_slice(&v),
                other => order_mismatch("values", &other),
            }
        }
    }

    fn all_gather_varcount(&self, local: &[f64], counts: &[usize], out: &mut [f64]) {
        let displs = displacements(counts);
        let pieces = self.exchange(Packet::Values(local.to_vec()));
        for ((piece, &start), &count) in pieces.iter().zip(&displs).zip(counts) {
            match piece {
                Packet::Values(v) => out[start..start + count].copy_from_slice(v),
                other => order_mismatch("values", other),
            }
        }
    }
}

/// Run `f` once per member of a fresh `size`-worker group, each on its own
/// thread, and return the results in rank order.
///
/// Workers block inside collectives, so each needs a dedicated thread; a
/// work-stealing pool smaller than the group would deadlock.
pub fn run_group<R, F>(size: usize, f: F) -> Vec<R>
where
    F: Fn(&LocalComm) -> R + Sync,
    R: Send,
{
    let comms = LocalComm::group(size);
    let f = &f;
    std::thread::scope(|scope| {
        let handles: Vec<_> = comms
            .into_iter()
            .map(|comm| {
                scope.spawn(move || {
                    let _span = tracing::trace_span!("worker", rank = comm.rank).entered();
                    f(&comm)
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap_or_else(|e| std::panic::resume_unwind(e)))
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_ranks_and_size() {
        let ids = run_group(4, |comm| (comm.rank(), comm.num_ranks()));
        assert_eq!(ids, vec![(0, 4), (1, 4), (2, 4), (3, 4)]);
    }

    #[test]
    fn all_reduce_max_agrees() {
        let out = run_group(3, |comm| comm.all_reduce_max(comm.rank() as f64 * 2.0 - 1.0));
        assert_eq!(out, vec![3.0; 3]);
    }

    #[test]
    fn max_loc_picks_lowest_row_on_tie() {
        let out = run_group(3, |comm| {
            let local = match comm.rank() {
                0 => PivotCandidate::NONE,
                1 => PivotCandidate::new(7.0, 5),
                _ => PivotCandidate::new(7.0, 4),
            };
            comm.all_reduce_max_loc(local)
        });
        for c in out {
            assert_eq!(c, PivotCandidate::new(7.0, 4));
        }
    }

    #[test]
    fn broadcast_from_non_zero_root() {
        let out = run_group(3, |comm| {
            let mut buf = vec![comm.rank() as f64; 2];
            comm.broadcast(2, &mut buf);
            buf
        });
        assert_eq!(out, vec![vec![2.0, 2.0]; 3]);
    }

    #[test]
    fn scatter_then_gather_restores_input() {
        let counts = vec![2, 1, 0, 3];
        let out = run_group(4, |comm| {
            let send: Vec<f64> = if comm.rank() == 0 {
                (0..6).map(f64::from).collect()
            } else {
                Vec::new()
            };
            let mut recv = vec![0.0; counts[comm.rank()]];
            comm.scatter_varcount(0, &send, &counts, &mut recv);
            let mut all = vec![0.0; 6];
            comm.all_gather_varcount(&recv, &counts, &mut all);
            (recv, all)
        });
        assert_eq!(out[1].0, vec![2.0]);
        assert!(out[2].0.is_empty());
        for (_, all) in out {
            assert_eq!(all, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
        }
    }

    #[test]
    fn many_back_to_back_collectives_stay_matched() {
        // Fast workers race ahead into later collectives; parked packets
        // must still pair up by source.
        let out = run_group(5, |comm| {
            let mut acc = 0.0;
            for round in 0..50 {
                let len = comm.broadcast_len(round % 5, round);
                acc += comm.all_reduce_max((comm.rank() + len) as f64);
            }
            acc
        });
        let expected: f64 = (0..50).map(|r| (4 + r) as f64).sum();
        assert!(out.iter().all(|&v| v == expected));
    }
}
