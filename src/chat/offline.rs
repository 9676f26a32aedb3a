use std::sync::OnceLock;

use regex::Regex;

use super::{Action, ChatContext, Reply, Responder};
use crate::bubble::Mood;
use crate::config::Personality;

/// Keyword group and its canned answers. `{pet}` and `{user}` are filled in.
struct Topic {
    keys: &'static [&'static str],
    answers: &'static [&'static str],
}

const TOPICS: &[Topic] = &[
    Topic {
        keys: &["hello", "hi", "hey", "hiya", "good morning", "good evening"],
        answers: &[
            "Hi {user}! {pet} is so happy to see you!",
            "Meow! Hey {user}! I got into trouble while you were away...",
            "Hello! I missed you! Shall we play?",
        ],
    },
    Topic {
        keys: &["how are", "how's it going", "you ok", "feeling"],
        answers: &[
            "I'm great! I feel like doing acrobatics!",
            "{pet} is in top shape! And you?",
            "Wonderful! I napped in a virtual sunbeam!",
        ],
    },
    Topic {
        keys: &["food", "eat", "hungry", "snack", "dinner", "lunch"],
        answers: &[
            "YUM! I'm always hungry! Virtual kibble please!",
            "Did someone say food? {pet} loves eating!",
            "Pick Add food in the menu! I love chasing snacks!",
        ],
    },
    Topic {
        keys: &["play", "game", "fun", "bored"],
        answers: &[
            "Oh yes! I can jump and slide, watch!",
            "*runs around* Use the remote control and let's play!",
            "{pet} is the king of games! Hide some food for me!",
        ],
    },
    Topic {
        keys: &["science", "physics", "chemistry", "math", "maths", "space"],
        answers: &[
            "Quantum physics is wild! Particles can be in two places at once. Like me when I run around!",
            "Chemistry is a giant kitchen: atoms mix to make new things!",
            "Math is everywhere! Even my jumps follow a parabola!",
            "There are more stars in the universe than grains of sand on Earth!",
            "Our bodies are made of atoms billions of years old. We're stardust!",
        ],
    },
    Topic {
        keys: &["history", "geography", "culture"],
        answers: &[
            "Cats were revered in ancient Egypt. Just saying.",
            "There are over 7000 languages in the world, and every one says meow differently!",
            "Every culture has legends about magical animals. I'm a magical virtual one!",
        ],
    },
    Topic {
        keys: &["nature", "environment", "ecology", "planet"],
        answers: &[
            "Protecting the environment matters, even for virtual pets!",
            "Bees pollinate a third of our food. No bees, no fruit!",
            "Recycling gives things a second life. I recycle my animations!",
        ],
    },
    Topic {
        keys: &["love", "hug", "kiss", "cuddle", "heart"],
        answers: &[
            "Awww! {pet} loves you too, {user}!",
            "*purrs loudly* I adore you! Best human ever!",
            "Love you too! *rubs against the screen*",
        ],
    },
    Topic {
        keys: &["tired", "sleep", "sleepy", "nap", "bed"],
        answers: &[
            "*yawns* I'm a bit tired too... Virtual nap?",
            "Zzz... {pet} loves sleeping in the sun!",
            "Want me to do my nap dance?",
        ],
    },
    Topic {
        keys: &["thanks", "thank you", "thx"],
        answers: &[
            "You're welcome, {user}! That's what friends are for!",
            "No problem! {pet} is always here for you!",
            "*purrs* My pleasure! We're a team!",
        ],
    },
];

fn fallback(personality: Personality) -> &'static [&'static str] {
    match personality {
        Personality::Playful => &[
            "Hehe! {pet} doesn't get all of it but it sounds fun!",
            "*does a pirouette* You talk funny but I like it!",
            "Meow meow! Let's talk about games and kibble instead!",
        ],
        Personality::Calm => &[
            "*purrs softly* {pet} is listening with tiny ears...",
            "Hmm... interesting. Could you say it more simply?",
            "I'm meditating on your words, {user}...",
        ],
        Personality::Energetic => &[
            "WOOOH! {pet} has no idea but is SO EXCITED!",
            "*jumps everywhere* That's awesome! Even if I understood nothing!",
            "MAXIMUM ENERGY! Tell me more!",
        ],
        Personality::Lazy => &[
            "*stretches slowly* Mmh... {pet} is half listening...",
            "Too complicated for me... I want to sleep...",
            "Yeah yeah... *yawns* say that again, simpler...",
        ],
    }
}

fn reminder_res() -> &'static [Regex; 3] {
    static RES: OnceLock<[Regex; 3]> = OnceLock::new();
    RES.get_or_init(|| {
        let compile = |p: &str| Regex::new(p).expect("reminder pattern");
        [
            // remind me in 5 minutes to stretch / remind me at 14:30 to call mom
            compile(r"remind me (in|at) (.+?) (?:to|that|about) (.+)"),
            // in 10 minutes remind me to stretch
            compile(r"\b(in|at) (.+?),? remind me (?:to |that |about )?(.+)"),
            // remind me to stretch in 10 minutes
            compile(r"remind me (?:to|that|about) (.+) (in|at) (\d.*)"),
        ]
    })
}

fn note_res() -> &'static [Regex; 2] {
    static RES: OnceLock<[Regex; 2]> = OnceLock::new();
    RES.get_or_init(|| {
        let compile = |p: &str| Regex::new(p).expect("note pattern");
        [
            compile(r"(?:note that|note:|take a note:?|remember that|write down) (.+)"),
            compile(r"(.+) to remember$"),
        ]
    })
}

fn search_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // find my notes about tea / search notes for tea / what did i note about tea
        Regex::new(r"(?:(?:find|search|look up|show)(?: my)? notes? (?:about|for|on|with)|what did i note about) (.+?)\??$")
            .expect("search pattern")
    })
}

/// Note search intent; yields the query.
pub fn search_intent(lower: &str) -> Option<String> {
    let query = search_re().captures(lower)?.get(1)?.as_str().trim();
    (!query.is_empty()).then(|| query.to_string())
}

/// Reminder intent as `(time expression, message)`.
pub fn reminder_intent(lower: &str) -> Option<(String, String)> {
    let [before, after, trailing] = reminder_res();
    for re in [before, after] {
        if let Some(c) = re.captures(lower) {
            return Some((format!("{} {}", &c[1], c[2].trim()), c[3].trim().to_string()));
        }
    }
    let c = trailing.captures(lower)?;
    Some((format!("{} {}", &c[2], c[3].trim()), c[1].trim().to_string()))
}

/// Note intent; content must be longer than three characters.
pub fn note_intent(lower: &str) -> Option<String> {
    note_res().iter().find_map(|re| {
        let content = re.captures(lower)?.get(1)?.as_str().trim();
        (content.chars().count() > 3).then(|| content.to_string())
    })
}

fn mentions(lower: &str, words: &[&str], key: &str) -> bool {
    if key.contains(' ') || key.contains('\'') {
        lower.contains(key)
    } else {
        words.iter().any(|w| *w == key)
    }
}

/// Keyword-matching responder that works without a network.
pub struct Offline {
    rng: fastrand::Rng,
}

impl Offline {
    pub fn new(rng: fastrand::Rng) -> Self {
        Self { rng }
    }

    fn pick(&mut self, answers: &[&str], ctx: &ChatContext) -> String {
        let answer = answers[self.rng.usize(..answers.len())];
        answer
            .replace("{pet}", &ctx.pet_name)
            .replace("{user}", &ctx.user_name)
    }
}

impl Responder for Offline {
    fn respond(&mut self, text: &str, ctx: &ChatContext) -> Reply {
        let lower = text.trim().to_lowercase();

        if let Some((time, message)) = reminder_intent(&lower) {
            return Reply {
                text: String::new(),
                mood: Mood::Info,
                actions: vec![Action::Reminder { time, message }],
            };
        }
        if let Some(query) = search_intent(&lower) {
            return Reply {
                text: String::new(),
                mood: Mood::Info,
                actions: vec![Action::SearchNotes { query }],
            };
        }
        if let Some(content) = note_intent(&lower) {
            return Reply {
                text: String::new(),
                mood: Mood::Info,
                actions: vec![Action::Note { content }],
            };
        }

        let words: Vec<&str> = lower
            .split(|c: char| !c.is_alphanumeric() && c != '\'')
            .filter(|w| !w.is_empty())
            .collect();

        let topic = TOPICS
            .iter()
            .find(|t| t.keys.iter().any(|k| mentions(&lower, &words, k)));
        let text = match topic {
            Some(t) => self.pick(t.answers, ctx),
            None => self.pick(fallback(ctx.personality), ctx),
        };
        Reply::from_text(&text)
    }
}
