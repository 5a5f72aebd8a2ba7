/// One element of an ordered stream where each primary item may be
/// followed by a single detail item that belongs to it.
#[derive(Debug, Clone, PartialEq)]
pub enum Item<R, D> {
    Row(R),
    Detail(D),
}

#[derive(Debug, PartialEq)]
pub struct Paired<R, D> {
    /// Every row in stream order, with its detail when one directly follows.
    pub pairs: Vec<(R, Option<D>)>,
    /// Details with no row immediately in front of them.
    pub orphans: Vec<D>,
}

/// Join rows with the detail that immediately follows them, looking one
/// item ahead. A consumed detail is never seen again.
pub fn pair_adjacent<R, D>(items: impl IntoIterator<Item = Item<R, D>>) -> Paired<R, D> {
    let mut iter = items.into_iter().peekable();
    let mut pairs = Vec::new();
    let mut orphans = Vec::new();

    while let Some(item) = iter.next() {
        match item {
            Item::Row(row) => {
                let detail = match iter.peek() {
                    Some(Item::Detail(_)) => match iter.next() {
                        Some(Item::Detail(d)) => Some(d),
                        _ => None,
                    },
                    _ => None,
                };
                pairs.push((row, detail));
            }
            Item::Detail(d) => orphans.push(d),
        }
    }

    Paired { pairs, orphans }
}
