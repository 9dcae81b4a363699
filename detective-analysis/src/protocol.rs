//! The Tri-Lens Protocol: the method the model is instructed to follow

use detective_core::Lens;

/// One lens with the questions it asks of a claim
#[derive(Debug, Clone, Copy)]
pub struct LensGuide {
    pub lens: Lens,
    pub tagline: &'static str,
    pub questions: &'static [&'static str],
}

pub const TRI_LENS_PROTOCOL: [LensGuide; 3] = [
    LensGuide {
        lens: Lens::Source,
        tagline: "Who is saying it, and why should they be believed?",
        questions: &[
            "Is the original source identifiable, or is it anonymous or second-hand?",
            "Does the source have a track record of accuracy on this topic?",
            "Is this a primary account, or a retelling of someone else's report?",
        ],
    },
    LensGuide {
        lens: Lens::Evidence,
        tagline: "What can actually be checked?",
        questions: &[
            "Are there verifiable data, documents, or citations behind the claim?",
            "Do independent, reputable outlets corroborate it?",
            "Are images, quotes, or numbers taken out of their original context?",
        ],
    },
    LensGuide {
        lens: Lens::Logic,
        tagline: "Does the reasoning hold together?",
        questions: &[
            "Does the conclusion follow from the evidence presented?",
            "Does it rely on fallacies, loaded language, or emotional manipulation?",
            "Is the claim internally consistent and plausible on its own terms?",
        ],
    },
];

/// Human-readable guide, as shown by `detective protocol`
pub fn protocol_guide() -> String {
    let mut out = String::from("The Tri-Lens Protocol\n");
    for (i, guide) in TRI_LENS_PROTOCOL.iter().enumerate() {
        out.push_str(&format!(
            "\n{}. {} - {}\n",
            i + 1,
            guide.lens.title(),
            guide.tagline
        ));
        for question in guide.questions {
            out.push_str(&format!("   - {}\n", question));
        }
    }
    out
}

/// System instruction sent with every analysis request
pub fn system_instruction() -> String {
    let mut prompt = String::from(
        "You are Digital Detective, a rigorous fact-checking analyst. \
         Examine the user's news item or claim using the Tri-Lens Protocol below. \
         Judge only what can be supported; when evidence is missing, say so and \
         prefer the verdict \"unverifiable\" over guessing.\n",
    );

    for guide in TRI_LENS_PROTOCOL.iter() {
        prompt.push_str(&format!("\n{} ({}):\n", guide.lens.title(), guide.tagline));
        for question in guide.questions {
            prompt.push_str(&format!("- {}\n", question));
        }
    }

    prompt.push_str(
        "\nRespond with a single JSON object and nothing else, using exactly these fields:\n\
         {\n\
           \"verdict\": one of \"verified\", \"likely_true\", \"misleading\", \"likely_false\", \"false\", \"unverifiable\",\n\
           \"credibility_score\": integer 0-100 (higher is more credible),\n\
           \"summary\": short paragraph explaining the verdict,\n\
           \"lenses\": [ { \"lens\": \"source\" | \"evidence\" | \"logic\", \"score\": integer 0-100, \"findings\": string } ],\n\
           \"red_flags\": [ string ],\n\
           \"verification_steps\": [ string ]\n\
         }\n\
         Include one entry in \"lenses\" for each of the three lenses. \
         Answer in the language the claim is written in.",
    );

    prompt
}
