use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use chesscore::{Board, MoveGenerator, Search, SearchConfig};

struct BenchCase {
    name: &'static str,
    fen: &'static str,
}

const CASES: &[BenchCase] = &[
    BenchCase {
        name: "startpos",
        fen: "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
    },
    BenchCase {
        name: "kiwipete",
        fen: "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
    },
    BenchCase {
        name: "endgame",
        fen: "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
    },
];

fn bench_perft(c: &mut Criterion) {
    let generator = MoveGenerator::new();
    let mut group = c.benchmark_group("perft");
    group.sample_size(10);
    for case in CASES {
        let board = Board::from_fen(case.fen).expect("bench FEN");
        group.bench_with_input(BenchmarkId::new(case.name, 2), &board, |b, board| {
            b.iter(|| generator.perft(black_box(board), 2).expect("perft"))
        });
    }
    group.finish();
}

fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("search");
    group.sample_size(10);
    for case in CASES {
        let board = Board::from_fen(case.fen).expect("bench FEN");
        for threads in [1, 4] {
            let config = SearchConfig::default().with_depth(3).with_threads(threads);
            group.bench_with_input(
                BenchmarkId::new(case.name, format!("d3_t{threads}")),
                &board,
                |b, board| {
                    b.iter(|| {
                        Search::with_config(config)
                            .find_best_move(black_box(board))
                            .expect("search")
                    })
                },
            );
        }
    }
    group.finish();
}

criterion_group!(benches, bench_perft, bench_search);
criterion_main!(benches);
