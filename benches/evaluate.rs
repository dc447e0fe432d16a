use divan::{Bencher, black_box};
use discoeval::export::{Corpus, ExportReader, read_corpus};
use discoeval::{EvalParams, LabelPool, Report, Tree, evaluate};

fn main() {
    divan::main();
}

/// A treebank of `n` sentences; with `swap`, every other sentence attaches
/// the adverb to the wrong VP
fn synthetic_corpus(n: usize, swap: bool) -> Corpus {
    let mut text = String::new();
    for i in 1..=n {
        let adverb_parent = if swap && i % 2 == 0 { 502 } else { 500 };
        text.push_str(&format!("#BOS {i}\n"));
        text.push_str(&format!("Darüber     PROAV   --  MO  {adverb_parent}\n"));
        text.push_str("muss        VMFIN   --  HD  503\n");
        text.push_str("nachgedacht VVPP    --  HD  500\n");
        text.push_str("werden      VAINF   --  HD  502\n");
        text.push_str(".           $.      --  --  0\n");
        text.push_str("#500        VP      --  OC  502\n");
        text.push_str("#502        VP      --  OC  503\n");
        text.push_str("#503        S       --  --  0\n");
        text.push_str(&format!("#EOS {i}\n"));
    }
    read_corpus(ExportReader::from_string(&text)).unwrap()
}

#[divan::bench(args = [100, 1000, 10000])]
fn evaluate_corpus(bencher: Bencher, n: usize) {
    let gold = synthetic_corpus(n, false);
    let test = synthetic_corpus(n, true);
    let params = EvalParams::default();
    bencher.bench_local(|| black_box(evaluate(black_box(&gold), black_box(&test), &params).unwrap()));
}

#[divan::bench]
fn build_trees(bencher: Bencher) {
    let gold = synthetic_corpus(1000, false);
    bencher.bench_local(|| {
        let mut pool = LabelPool::new();
        for sentence in gold.values() {
            black_box(Tree::from_sentence(sentence, "VROOT", &mut pool).unwrap());
        }
    });
}

#[divan::bench]
fn render_report(bencher: Bencher) {
    let gold = synthetic_corpus(1000, false);
    let test = synthetic_corpus(1000, true);
    let evaluation = evaluate(&gold, &test, &EvalParams::default()).unwrap();
    bencher.bench_local(|| black_box(Report::new(&evaluation).to_string()));
}
