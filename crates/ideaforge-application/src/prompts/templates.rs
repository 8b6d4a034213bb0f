//! Built-in prompt templates.
//!
//! The wording here is the only thing that pins down the response shape; the
//! normalizer repairs formatting, never content.

pub const CLASSIFICATION: &str = r#"You are classifying user-generated content for product research.

Decide whether the post below describes a PAIN POINT: a concrete, recurring
problem, frustration or unmet need that someone could build a product for.
Announcements, memes, general questions and self-promotion are NOT pain points.

Title: {{ title }}
Body:
{{ body }}

Respond with a single JSON object and nothing else:
{
  "isPainPoint": boolean,
  "reason": string,        // one sentence explaining the decision
  "confidence": number,    // between 0 and 1
  "categories": string[]   // e.g. ["productivity", "finance"]; empty when not a pain point
}

Example:
{"isPainPoint": true, "reason": "The author spends hours reconciling invoices by hand every month.", "confidence": 0.85, "categories": ["finance", "automation"]}

Do not add any prose, explanation or markdown outside the JSON object."#;

pub const EXTRACTION: &str = r#"You are a market research analyst. Identify the pain points expressed in the posts below.

Include a pain point only if:
- it describes a specific problem, frustration or unmet need
- at least one post states it directly, not just by implication
- a product or service could plausibly address it

Exclude:
- complaints about a single named person or company with no broader pattern
- feature requests for one specific existing product
- jokes, rants without a concrete problem, and off-topic content

Posts:
{% for post in posts %}
[{{ post.id }}]{% if post.source %} ({{ post.source }}){% endif %} {{ post.title }}
{{ post.body }}
{% endfor %}

Respond with JSON only, in exactly this shape:
{
  "painPoints": [
    {
      "title": string,             // short name for the problem
      "description": string,       // two or three sentences
      "category": string,
      "severity": "low" | "medium" | "high",
      "frequency": number,         // how many posts mention it
      "exampleQuotes": string[],   // verbatim quotes from the posts
      "sourcePostIds": string[]    // ids in square brackets above
    }
  ]
}

Return an empty "painPoints" array if no post qualifies. Do not wrap the JSON in markdown."#;

pub const IDEA_GENERATION: &str = r#"You are a startup strategist. Propose business ideas for the pain points below.

Pain points:
{% for pain_point in pain_points %}
{{ loop.index }}. {{ pain_point.title }}{% if pain_point.severity %} (severity: {{ pain_point.severity }}){% endif %}

   {{ pain_point.description }}
{% endfor %}

Rules:
- Generate at least {{ min_ideas }} ideas in total.
- Each idea addresses exactly ONE pain point; copy its title verbatim into "relatedPainPointTitle".
- Every list field must contain at least {{ min_list_items }} items.
- Be specific: name the target customer, the core mechanism and how it makes money. Avoid generic advice such as "build an app" or "use AI".

Respond with JSON only, in exactly this shape:
{
  "ideas": [
    {
      "title": string,
      "description": string,
      "relatedPainPointTitle": string,
      "targetAudience": string,
      "keyFeatures": string[],
      "revenueStreams": string[],
      "challenges": string[]
    }
  ]
}"#;

pub const LANDING_PAGE: &str = r#"Create a landing page for the product below.

Product: {{ spec.title }}
{% if spec.tagline %}Tagline: {{ spec.tagline }}
{% endif %}Description: {{ spec.description }}
{% if spec.targetAudience %}Target audience: {{ spec.targetAudience }}
{% endif %}{% if spec.tone %}Tone: {{ spec.tone }}
{% endif %}{% if spec.features %}Key features:
{% for feature in spec.features %}- {{ feature }}
{% endfor %}{% endif %}
{% if structured %}
Respond with a single JSON object describing the page content:
{
  "hero": { "headline": string, "subheadline": string, "ctaText": string },
  "features": [ { "title": string, "description": string } ],
  "testimonials": [ { "quote": string, "author": string } ],
  "pricing": [ { "plan": string, "price": string, "features": string[] } ],
  "faq": [ { "question": string, "answer": string } ],
  "metaTags": { "title": string, "description": string, "keywords": string[] }
}
Include at least 3 features and 2 FAQ entries. JSON only, no markdown.
{% else %}
Write a single self-contained React function component:
- start with `import React from 'react';` and import any other packages you use
- style with Tailwind CSS utility classes only
- include hero, features, social proof and call-to-action sections
- end with `export default` for the component
Respond with the code only, no explanation.
{% endif %}"#;
