use std::collections::HashSet;

use crate::models::Project;

pub const SEED_ID_PREFIX: &str = "default-";

struct SeedRecord {
    id: &'static str,
    title: &'static str,
    description: &'static str,
    image: &'static str,
    tech_stack: &'static [&'static str],
    live_url: &'static str,
    github_url: &'static str,
}

const SEEDS: &[SeedRecord] = &[
    SeedRecord {
        id: "default-1",
        title: "E-Commerce Platform",
        description: "A full-stack e-commerce platform with React, Node.js, and PostgreSQL. \
            Features include user authentication, payment processing, and admin dashboard.",
        image: "https://images.unsplash.com/photo-1556742049-0cfed4f6a45d?w=500&h=300&fit=crop",
        tech_stack: &["React", "Node.js", "PostgreSQL", "Stripe", "Tailwind CSS"],
        live_url: "https://example.com",
        github_url: "https://github.com",
    },
    SeedRecord {
        id: "default-2",
        title: "Task Management App",
        description: "A collaborative task management application with real-time updates, \
            drag & drop functionality, and team collaboration features.",
        image: "https://images.unsplash.com/photo-1611224923853-80b023f02d71?w=500&h=300&fit=crop",
        tech_stack: &["React", "TypeScript", "Firebase", "Material-UI"],
        live_url: "https://example.com",
        github_url: "https://github.com",
    },
];

impl From<&SeedRecord> for Project {
    fn from(seed: &SeedRecord) -> Self {
        Project {
            id: seed.id.to_string(),
            title: seed.title.to_string(),
            description: seed.description.to_string(),
            image: seed.image.to_string(),
            tech_stack: seed.tech_stack.iter().map(|t| t.to_string()).collect(),
            live_url: seed.live_url.to_string(),
            github_url: seed.github_url.to_string(),
        }
    }
}

/// All built-in projects in declaration order.
pub fn seed_projects() -> Vec<Project> {
    SEEDS.iter().map(Project::from).collect()
}

pub fn is_seed_id(id: &str) -> bool {
    id.starts_with(SEED_ID_PREFIX) && SEEDS.iter().any(|seed| seed.id == id)
}

/// Seeds that have not been tombstoned on this client, declaration order preserved.
pub fn visible_seeds(tombstones: &HashSet<String>) -> Vec<Project> {
    SEEDS
        .iter()
        .filter(|seed| !tombstones.contains(seed.id))
        .map(Project::from)
        .collect()
}
