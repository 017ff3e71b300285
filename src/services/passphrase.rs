use rand::seq::SliceRandom;
use rand::Rng;

/// Adjective half of the word corpus. Word tokens alternate adjective then
/// noun so two-word secrets read as a name ("brisk-otter").
static ADJECTIVES: &[&str] = &[
    "able", "acute", "agile", "airy", "amber", "ample", "apt", "avid", "awake", "azure", "balmy",
    "bold", "brave", "breezy", "brief", "bright", "brisk", "broad", "calm", "candid", "cheery",
    "chief", "civil", "clear", "clever", "close", "cloudy", "cobalt", "cosy", "coral", "crisp",
    "daring", "dearest", "deep", "deft", "dense", "direct", "dry", "eager", "early", "earnest",
    "easy", "elder", "equal", "even", "exact", "fair", "famous", "fancy", "fast", "fine", "firm",
    "fleet", "fond", "frank", "free", "fresh", "full", "gentle", "giant", "glad", "golden",
    "good", "grand", "great", "green", "handy", "happy", "hardy", "hazel", "heavy", "helpful",
    "honest", "humble", "ideal", "indigo", "inner", "ivory", "jolly", "jovial", "keen", "kind",
    "large", "lasting", "light", "likely", "limber", "lively", "local", "loyal", "lucid",
    "lucky", "main", "major", "mellow", "merry", "mighty", "mild", "modern", "modest", "moving",
    "native", "neat", "nimble", "noble", "normal", "novel", "olive", "open", "optimal", "pale",
    "patient", "peachy", "placid", "plain", "pleasant", "plucky", "polite", "portly", "prime",
    "prompt", "proud", "pure", "quick", "quiet", "rapid", "rare", "ready", "regal", "rich",
    "robust", "rosy", "round", "ruby", "rustic", "safe", "sage", "scarlet", "secure", "serene",
    "sharp", "shiny", "silent", "silver", "sincere", "sleek", "smart", "smooth", "snug", "solid",
    "sound", "spry", "stable", "steady", "stern", "still", "strong", "sturdy", "subtle", "sunny",
    "super", "swift", "tall", "teal", "tender", "tidy", "topical", "tough", "true", "trusty",
    "upbeat", "usable", "valid", "vast", "violet", "vital", "vivid", "warm", "wealthy", "whole",
    "wise", "witty", "worthy", "young", "zesty",
];

/// Noun half of the word corpus.
static NOUNS: &[&str] = &[
    "acorn", "alder", "anchor", "antler", "apple", "arch", "aspen", "badger", "banjo", "bass",
    "beacon", "bear", "beech", "bison", "boulder", "bramble", "breeze", "brook", "bridge",
    "bunting", "camel", "canary", "canyon", "castle", "cedar", "cellar", "cheetah", "cherry",
    "cliff", "clover", "cobbler", "comet", "condor", "copper", "coyote", "crane", "creek",
    "cricket", "crow", "cypress", "daisy", "deer", "dingo", "dolphin", "donkey", "dove",
    "dragon", "eagle", "ember", "falcon", "fennel", "ferret", "finch", "fjord", "flint", "fox",
    "garnet", "gazelle", "gecko", "gibbon", "ginger", "glacier", "goose", "gopher", "granite",
    "grouse", "gull", "harbor", "hare", "hawk", "hazel", "heron", "hickory", "hornet", "horse",
    "ibis", "iris", "island", "jackal", "jaguar", "jasper", "juniper", "kestrel", "kitten",
    "koala", "lagoon", "lark", "lemur", "lily", "linnet", "lizard", "llama", "lobster", "lynx",
    "magpie", "mallard", "mango", "maple", "marble", "marmot", "marten", "meadow", "merlin",
    "mole", "moose", "morning", "moth", "newt", "nutmeg", "oak", "ocelot", "orchid", "osprey",
    "otter", "owl", "panda", "pebble", "pelican", "penguin", "pepper", "pigeon", "pine",
    "plover", "pony", "poplar", "prairie", "puffin", "quail", "quartz", "rabbit", "raccoon",
    "raven", "reed", "ridge", "river", "robin", "rowan", "saffron", "salmon", "sardine",
    "seal", "shrike", "sparrow", "spruce", "squid", "starling", "stoat", "stork", "summit",
    "swallow", "swan", "tamarin", "tapir", "teal", "tern", "thistle", "thrush", "tiger",
    "timber", "toucan", "trout", "tulip", "tundra", "turtle", "valley", "vole", "walnut",
    "walrus", "warbler", "weasel", "willow", "wolf", "wombat", "wren", "zebra",
];

#[derive(Debug, Clone, Copy, PartialEq)]
enum PatternToken {
    Word,
    Digit,
    Separator(char),
}

/// Deterministic-free secret generator driven by a pattern string. `word` and
/// `digit` are the draw tokens; any other character is a literal separator.
/// Example patterns: `word-word`, `word.digit.word.digit`.
#[derive(Debug, Clone)]
pub struct PassphrasePolicy {
    tokens: Vec<PatternToken>,
}

impl PassphrasePolicy {
    pub fn parse(pattern: &str) -> Result<Self, anyhow::Error> {
        let mut tokens = Vec::new();
        let mut rest = pattern;

        while !rest.is_empty() {
            if let Some(tail) = rest.strip_prefix("word") {
                tokens.push(PatternToken::Word);
                rest = tail;
            } else if let Some(tail) = rest.strip_prefix("digit") {
                tokens.push(PatternToken::Digit);
                rest = tail;
            } else {
                let ch = rest.chars().next().expect("rest is non-empty");
                tokens.push(PatternToken::Separator(ch));
                rest = &rest[ch.len_utf8()..];
            }
        }

        if !tokens
            .iter()
            .any(|t| matches!(t, PatternToken::Word | PatternToken::Digit))
        {
            return Err(anyhow::anyhow!(
                "passphrase pattern '{}' contains no word or digit tokens",
                pattern
            ));
        }

        Ok(Self { tokens })
    }

    /// One random draw per token; never consults previously issued secrets.
    pub fn generate(&self) -> String {
        let mut rng = rand::thread_rng();
        let mut out = String::new();
        let mut word_index = 0usize;

        for token in &self.tokens {
            match token {
                PatternToken::Word => {
                    let list = if word_index % 2 == 0 { ADJECTIVES } else { NOUNS };
                    out.push_str(list.choose(&mut rng).expect("wordlist is non-empty"));
                    word_index += 1;
                }
                PatternToken::Digit => {
                    out.push(char::from(b'0' + rng.gen_range(0..10u8)));
                }
                PatternToken::Separator(ch) => out.push(*ch),
            }
        }

        out
    }
}
