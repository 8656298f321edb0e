use honggfuzz::fuzz;
use oldfiles_cleaner::{filter, Predicate, PredicateSet};

fn main() {
    let preds = PredicateSet::new().with(Predicate::pattern("a").unwrap());
    loop {
        fuzz!(|data: &[u8]| {
            let mut out = Vec::new();
            if filter(data, &mut out, &preds).is_ok() {
                // A second pass over accepted output must be a no-op.
                let mut again = Vec::new();
                let removed = filter(&out[..], &mut again, &preds).unwrap();
                assert!(removed.is_empty());
                assert_eq!(out, again);
            }
        });
    }
}
