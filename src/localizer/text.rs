/// Title-case a path segment: the first letter of every word is uppercased and
/// the rest lowercased. Words already written in capitals (acronyms) are kept.
///
/// Words are runs of alphanumeric characters, so `about-us` becomes `About-Us`.
pub fn title_case(segment: &str) -> String {
    let mut result = String::with_capacity(segment.len());
    let mut word = String::new();

    for ch in segment.chars() {
        if ch.is_alphanumeric() {
            word.push(ch);
        } else {
            push_word(&mut result, &word);
            word.clear();
            result.push(ch);
        }
    }
    push_word(&mut result, &word);

    result
}

fn push_word(result: &mut String, word: &str) {
    let is_acronym = word.chars().any(char::is_alphabetic)
        && word
            .chars()
            .filter(|ch| ch.is_alphabetic())
            .all(char::is_uppercase);
    if is_acronym {
        result.push_str(word);
        return;
    }

    let mut chars = word.chars();
    if let Some(first) = chars.next() {
        result.extend(first.to_uppercase());
        for ch in chars {
            result.extend(ch.to_lowercase());
        }
    }
}
