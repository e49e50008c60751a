/// One position of a mutated token sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    /// Copied or bound token.
    Fixed(String),
    /// Unbound placeholder with its selected candidates, best first.
    Choices(Vec<String>),
}

/// Cartesian product over the slots. The first slot with choices varies
/// slowest. The number of variants is the product of the choice counts, so
/// any empty choice list yields no variant at all.
pub fn expand_variants(slots: &[Slot]) -> Vec<Vec<String>> {
    let mut variants: Vec<Vec<String>> = vec![Vec::with_capacity(slots.len())];
    for slot in slots {
        match slot {
            Slot::Fixed(token) => variants.iter_mut().for_each(|v| v.push(token.clone())),
            Slot::Choices(choices) => {
                variants = variants
                    .into_iter()
                    .flat_map(|prefix| {
                        choices.iter().map(move |choice| {
                            let mut v = prefix.clone();
                            v.push(choice.clone());
                            v
                        })
                    })
                    .collect();
            }
        }
    }
    variants
}
