use walks_core::RecommendationRequest;

pub fn system_prompt(city_name: &str) -> String {
    format!(
        "Ты профессиональный гид по городу {city_name}. Отвечай на русском языке. \
         Возвращай только валидный JSON без дополнительного текста."
    )
}

pub fn user_prompt(request: &RecommendationRequest, city_name: &str) -> String {
    let profile = &request.profile;
    let count = request.target_count;

    let places = request
        .candidates
        .iter()
        .enumerate()
        .map(|(index, candidate)| {
            format!(
                "Место {}: {}\nАдрес: {}\nРасстояние от пользователя: {:.2} км\nОписание: {}",
                index + 1,
                candidate.name,
                candidate.address,
                candidate.distance_km,
                candidate.description
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        r#"Ты эксперт по туризму в городе {city_name}.

Пользователь: {name}, возраст {age} лет
Интересы: {interests}

Из следующего списка мест выбери РОВНО {count} самых подходящих для этого пользователя:

{places}

Верни ответ СТРОГО в формате JSON (без дополнительного текста):
{{
  "selected_places": [
    {{
      "place_name": "ТОЧНОЕ название места из списка выше (скопируй как есть)",
      "reason": "короткое объяснение на русском (2-3 предложения), почему это место подходит пользователю {name} с учётом интересов: {interests}"
    }}
  ]
}}

Правила:
- Выбери РОВНО {count} мест, не меньше и не больше.
- Копируй названия ТОЧНО как в списке (после "Место N:"), не добавляй название города и другие префиксы.
- Объяснение должно быть персонализированным.
- Верни ТОЛЬКО JSON, без markdown-разметки и комментариев."#,
        name = profile.name,
        age = profile.age,
        interests = profile.interests,
    )
}
