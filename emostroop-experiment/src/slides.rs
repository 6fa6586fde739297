use emostroop_core::{BlockRole, Emotion, KeyMap, ResponseKey, Slide};

const CONTINUE: &str = "Para continuar presione la tecla Espacio...";

pub fn welcome() -> Slide {
    Slide::new([
        "Bienvenido/a, a este experimento!!!",
        " ",
        "Se te indicará paso a paso que hacer.",
    ])
    .with_footer(CONTINUE)
}

fn key_word(keymap: KeyMap, key: ResponseKey) -> &'static str {
    match keymap.emotion_for(key) {
        Emotion::Happy => "FELIZ",
        Emotion::Sad => "TRISTE",
    }
}

/// Task instructions for block `index`, with the key legend of `keymap`.
pub fn instructions(role: BlockRole, index: u8, keymap: KeyMap) -> Slide {
    let opening = if index == 2 { "Esta vez s" } else { "S" };
    let task: [String; 2] = match role {
        BlockRole::FaceIdentification => [
            format!(
                "{opening}u tarea principal es identificar la emoción del rostro (si la persona está triste o feliz),"
            ),
            "ignorando por completo la palabra que está escrita encima. No intente leer la palabra, solo mire la cara.".into(),
        ],
        BlockRole::WordIdentification => [
            format!(
                "{opening}u tarea principal es responder usando la emoción que aparece escrita en la palabra, ignorando por completo la emoción"
            ),
            "que expresa el rostro (si la persona está triste o feliz). No intente descifrar la emoción en el rostro, sólo lea la palabra.".into(),
        ],
    };

    let mut lines: Vec<String> = vec![
        "Ahora comenzaremos con el experimento.".into(),
        " ".into(),
        "En esta prueba vamos a ver una serie de fotografías de rostros de personas en la pantalla.".into(),
        "Notará que sobre cada rostro hay una palabra escrita en color.".into(),
    ];
    lines.extend(task);
    lines.extend(
        [
            "Debe responder lo más rápido posible, siguiendo su primera impresión, pero intentando no cometer errores.",
            "No se detenga a analizar demasiado cada imagen; confíe en lo que perciba de inmediato.",
            " ",
            "Para responder, utilizaremos únicamente su mano derecha sobre el teclado. Por favor, coloque sus dedos así:",
            " ",
        ]
        .map(String::from),
    );
    lines.push(format!(
        "El dedo índice sobre la tecla [V] para indicar {}.",
        key_word(keymap, ResponseKey::V)
    ));
    lines.push(format!(
        "El dedo medio sobre la tecla [N] para indicar {}.",
        key_word(keymap, ResponseKey::N)
    ));

    Slide {
        lines,
        footer: Some(CONTINUE.into()),
    }
}

/// Rest page shown after block `index`.
pub fn rest(index: u8) -> Slide {
    Slide::new([
        format!("Fin del bloque {index}."),
        " ".into(),
        "Tómate de 2 a 3 minutos para descansar.".into(),
        " ".into(),
        "Cuando estés lista/o para continuar presiona la barra espaciadora.".into(),
    ])
}

pub fn farewell() -> Slide {
    Slide::new([
        "La tarea ha finalizado.",
        " ",
        "Muchas gracias por su colaboración!!",
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_legend_follows_mapping() {
        let slide = instructions(BlockRole::FaceIdentification, 1, KeyMap::SadOnV);
        let legend = &slide.lines[slide.lines.len() - 2..];
        assert!(legend[0].contains("[V] para indicar TRISTE"));
        assert!(legend[1].contains("[N] para indicar FELIZ"));
    }

    #[test]
    fn second_block_wording_and_rule() {
        let slide = instructions(BlockRole::WordIdentification, 2, KeyMap::HappyOnV);
        assert!(slide.lines.iter().any(|l| l.starts_with("Esta vez su tarea")));
        assert!(slide.lines.iter().any(|l| l.contains("sólo lea la palabra")));
        assert_eq!(rest(1).lines[0], "Fin del bloque 1.");
    }
}
