//! Human-readable client names.
//!
//! Names are for logs and lobby screens only. They are derived from the
//! peer handle, so two clients can share a name; identity is always the
//! [`ClientId`](gamelink_protocol::ClientId).

use gamelink_protocol::PeerHandle;

const ANIMAL_NAMES: &[&str] = &[
    "Elephant", "Dolphin", "Lion", "Tiger", "Bear", "Wolf", "Giraffe", "Kangaroo",
    "Penguin", "Whale", "Jellyfish", "Fox", "Monkey", "Koala", "Gazelle",
    "Hippopotamus", "Otter", "Crocodile", "Porcupine", "Horse", "Frog",
    "Rhinoceros", "Cheetah", "Walrus", "Squirrel", "Sloth", "Bison", "Gorilla",
    "Badger", "Skunk", "Zebra", "Ostrich", "Llama", "Anteater", "Moose", "Beaver",
    "Chimpanzee", "Panda", "Aardvark", "Rabbit", "Snail", "Camel", "Meerkat",
    "Hamster", "Bat", "Eagle", "Shark", "Octopus", "Toucan", "Peacock", "Flamingo",
    "Goat", "Sheep", "Deer", "Hedgehog", "Wildebeest", "Buffalo", "Antelope",
    "Orangutan", "Lynx", "Raccoon", "Tapir", "Armadillo", "Mole", "Ferret",
    "Platypus", "Seal", "Owl", "Turtle", "Lemur", "Swan", "Snake", "Parrot",
    "Polar Bear", "Starfish", "Sea Lion", "Pufferfish", "Hyena", "Crab", "Gecko",
    "Salmon", "Spider", "Swordfish", "Ray", "Catfish", "Albatross", "Seahorse",
    "Piranha", "Coyote", "Parakeet", "Iguana", "Hummingbird", "Barracuda",
    "Falcon", "Manta Ray", "Mongoose", "Duck",
];

/// Knuth's multiplicative hash constant.
const SPREAD: u64 = 2_654_435_761;

/// Picks a stable animal name for `peer`.
pub fn client_name(peer: PeerHandle) -> &'static str {
    let index = peer.into_inner().wrapping_mul(SPREAD) % ANIMAL_NAMES.len() as u64;
    ANIMAL_NAMES[index as usize]
}
