//! Шаблоны запросов к сервису генерации текста

/// Запрос на извлечение длительностей кадров из сценария
pub fn duration_extraction_prompt(script: &str) -> String {
    format!(
        r#"
You extract per-image display durations from a video script.
The script lists a sequence of images, usually with a time range for each one.
Work out how many seconds each image stays on screen.

**Response rules:**
1. Reply with **a JSON array of numbers only**, one number of seconds per image, in script order.
2. No prose, no explanations, no Markdown.
3. The array must be valid JSON.
4. If the script gives no explicit ranges, infer sensible durations from the context.
5. If nothing can be inferred, reply with an empty array `[]`.

**Example 1:**
Script:
"""
(0s-5s) Image 1: A cat sitting on a mat.
(5s-10s) Image 2: A dog playing in the park.
(10s-15s) Image 3: A bird flying in the sky.
"""

Output:
[5, 5, 5]

**Example 2:**
Script:
"""
(0s-3s) Image 1: A sunrise over the mountains.
(3s-7s) Image 2: A river flowing through a forest.
(7s-12s) Image 3: A city skyline at night.
"""

Output:
[3, 4, 5]

**Example 3:**
Script:
"""
A sequence of images without any timing information.
"""

Output:
[]

**Script to analyze:**
"""
{script}
"""

**Your response (ONLY a JSON array of numbers):**
"#,
        script = script.trim()
    )
}

const SEGMENTATION_EXAMPLE: &str = "Think you know anime? Let's settle this! \
    Who would win in a dance battle? Naruto with his Shadow Clone Jutsu moves? \
    Goku breaking the floor with his Super Saiyan energy?";

/// Запрос на разбиение сплошного текста озвучки на строки субтитров
pub fn line_segmentation_prompt(transcript: &str) -> String {
    format!(
        r#"
**Task:** Split the transcript below into short subtitle lines
for a 15-30 second vertical video.

**Transcript:**
{transcript}

**Requirements:**
1. One line per row; each line is easy to read at a glance.
2. Each line is a complete thought or sentence.
3. Keep the original wording and order.
4. Output only the lines, with no introduction such as "Here are the lines".

**Example Input:**
{example}

**Example Output:**
Think you know anime? Let's settle this!
Who would win in a dance battle?
Naruto with his Shadow Clone Jutsu moves?
Goku breaking the floor with his Super Saiyan energy?

**Your Response (Only the split lines):**
"#,
        transcript = transcript.trim(),
        example = SEGMENTATION_EXAMPLE
    )
}

/// Дополнение к описанию изображения для генератора
pub fn decorate_image_prompt(prompt: &str) -> String {
    format!(
        "{}. \nPlease make the image vibrant and visually distinct!\n\
         IMPORTANT: The image should not have any text, \
         except for meaningful background text in English.",
        prompt.trim().trim_end_matches('.')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompts_embed_their_input() {
        let script = "(0s-4s) Image 1: Goku powering up.";
        assert!(duration_extraction_prompt(script).contains(script));
        assert!(line_segmentation_prompt("  one two three  ").contains("\none two three\n"));
    }

    #[test]
    fn image_prompt_is_decorated_once() {
        let decorated = decorate_image_prompt("A neon city at night.");
        assert!(decorated.starts_with("A neon city at night. \n"));
        assert!(decorated.contains("vibrant and visually distinct"));
    }
}
